//! Rigid body physics backend
//!
//! Thin wrapper around rapier2d. Landers and terrain only ever touch each
//! other: lander colliders belong to [`Category::Lander`] and only interact
//! with [`Category::Terrain`], and vice versa.
//!
//! Collisions are not delivered through callbacks. [`PhysicsWorld::step`]
//! returns the first contacts of the step and the caller dispatches them.

use std::collections::HashSet;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::config::PhysicsConfig;

/// Collision category of a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lander,
    Terrain,
}

impl Category {
    /// Membership bit of this category
    pub const fn group(self) -> Group {
        match self {
            Category::Lander => Group::GROUP_1,
            Category::Terrain => Group::GROUP_2,
        }
    }

    /// Interaction groups: each category only collides with the other one
    pub const fn interaction_groups(self) -> InteractionGroups {
        match self {
            Category::Lander => InteractionGroups::new(Group::GROUP_1, Group::GROUP_2),
            Category::Terrain => InteractionGroups::new(Group::GROUP_2, Group::GROUP_1),
        }
    }

    /// Recover the category from a collider's interaction groups
    pub fn from_groups(groups: InteractionGroups) -> Option<Self> {
        if groups.memberships.contains(Group::GROUP_1) {
            Some(Category::Lander)
        } else if groups.memberships.contains(Group::GROUP_2) {
            Some(Category::Terrain)
        } else {
            None
        }
    }
}

/// First contact between a lander body and the terrain body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionEvent {
    pub lander: RigidBodyHandle,
    pub terrain: RigidBodyHandle,
}

/// Collects rapier's "started" collision events during a step
#[derive(Default)]
struct ContactCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: rapier2d::geometry::CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let rapier2d::geometry::CollisionEvent::Started(a, b, _) = event {
            if let Ok(mut started) = self.started.lock() {
                started.push((a, b));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Manages the rapier2d physics world
pub struct PhysicsWorld {
    /// Gravity vector (screen space, +y points down)
    gravity: Vector<Real>,

    /// Rapier rigid body set
    rigid_body_set: RigidBodySet,

    /// Rapier collider set
    collider_set: ColliderSet,

    /// Physics pipeline
    pipeline: PhysicsPipeline,

    /// Integration parameters
    integration_parameters: IntegrationParameters,

    /// Island manager
    island_manager: IslandManager,

    /// Broad phase
    broad_phase: BroadPhase,

    /// Narrow phase
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver
    ccd_solver: CCDSolver,

    /// Query pipeline
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create an empty world with downward gravity and a fixed timestep
    pub fn new(config: &PhysicsConfig) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: config.timestep(),
            ..Default::default()
        };

        log::debug!(
            "Physics: gravity={} dt={:.4}",
            config.gravity,
            integration_parameters.dt
        );

        Self {
            gravity: vector![0.0, config.gravity],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Fixed timestep in seconds
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Advance the simulation by one timestep.
    ///
    /// Returns one event per lander/terrain body pair that started touching
    /// during this step.
    pub fn step(&mut self) -> Vec<CollisionEvent> {
        let physics_hooks = ();
        let collector = ContactCollector::default();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &collector,
        );

        let started = collector.started.into_inner().unwrap_or_default();
        self.resolve_contacts(started)
    }

    /// Map collider pairs to lander/terrain body pairs, once per pair
    fn resolve_contacts(
        &self,
        started: Vec<(ColliderHandle, ColliderHandle)>,
    ) -> Vec<CollisionEvent> {
        let mut seen = HashSet::new();
        let mut events = Vec::new();

        for (a, b) in started {
            let (Some(first), Some(second)) = (self.classify(a), self.classify(b)) else {
                continue;
            };

            let event = match (first, second) {
                ((Category::Lander, lander), (Category::Terrain, terrain))
                | ((Category::Terrain, terrain), (Category::Lander, lander)) => {
                    CollisionEvent { lander, terrain }
                }
                _ => continue,
            };

            if seen.insert(event) {
                events.push(event);
            }
        }

        events
    }

    /// Category and parent body of a collider
    fn classify(&self, handle: ColliderHandle) -> Option<(Category, RigidBodyHandle)> {
        let collider = self.collider_set.get(handle)?;
        let category = Category::from_groups(collider.collision_groups())?;
        Some((category, collider.parent()?))
    }

    /// Insert a rigid body
    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(body)
    }

    /// Attach a collider to a body
    pub fn insert_collider(
        &mut self,
        collider: Collider,
        parent: RigidBodyHandle,
    ) -> ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    /// Remove a body together with all of its colliders.
    ///
    /// Removing a body that is already gone is a no-op and returns `false`.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let removed = self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );

        if removed.is_none() {
            log::debug!("Physics: body {:?} already removed", handle);
        }
        removed.is_some()
    }

    /// Whether the body is still part of the world
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Get a rigid body
    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Get a mutable rigid body
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Get a collider
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Get a mutable collider
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.collider_set.get_mut(handle)
    }

    /// Distance from `point` to the nearest collider of `target`.
    ///
    /// Only colliders known to the query pipeline are considered, which means
    /// colliders inserted since the last [`step`](Self::step) are invisible.
    pub fn nearest_distance(&self, point: Vec2, target: Category) -> Option<f32> {
        let groups = InteractionGroups::new(Group::ALL, target.group());
        let filter = QueryFilter::new().groups(groups);
        let query = point![point.x, point.y];

        self.query_pipeline
            .project_point(
                &self.rigid_body_set,
                &self.collider_set,
                &query,
                true,
                filter,
            )
            .map(|(_, projection)| (projection.point - query).norm())
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of colliders in the world
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

/// Convert a glam vector to a rapier vector
pub fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

/// Convert a glam vector to a rapier point
pub fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

/// Convert a rapier vector to glam
pub fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Convert a rapier point to glam
pub fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}
