//! Lander entity: rigid hull with a fuel tank, sensors and engines
//!
//! A lander is a single rigid body made of five fixed hull capsules plus one
//! fuel-span capsule whose mass tracks the remaining fuel. Every tick it reads
//! its sensors, asks its controller for throttles, burns fuel and applies
//! engine forces. First contact with the terrain either lands it (slow
//! enough) or destroys it.

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::fitness::{FitnessFunction, FitnessInput};
use super::hull::{fuel_span_center, FUEL_SPAN, HULL_SEGMENTS, SEGMENT_RADIUS};
use super::layout::{Mount, Throttle, ThrusterLayout};
use super::sensors::{self, SensorReadings, SensorSuite, SENSOR_MISS};
use crate::error::LanderError;
use crate::neural::{Controller, GenomeId};
use crate::physics::{from_point, from_vector, to_point, to_vector, Category, PhysicsWorld};
use crate::terrain::{LandingZone, TerrainProfile};

/// What happens when a lander rolls past the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollMode {
    /// Destroy the lander immediately
    #[default]
    Kill,
    /// Add a fixed penalty every tick spent past the threshold
    Penalize,
}

/// Resolved roll handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollPolicy {
    Kill { threshold: f32 },
    Penalize { threshold: f32, penalty: f32 },
}

/// Physical constants and behaviour of a lander
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderConfig {
    pub layout: ThrusterLayout,
    pub sensors: SensorSuite,
    /// Total mass of the hull segments
    pub dry_mass: f32,
    /// Fuel (and fuel-span mass) at spawn
    pub max_fuel: f32,
    /// Full-throttle force of one engine
    pub thrust: f32,
    /// Fuel burnt per tick by one engine at full throttle
    pub consume_rate: f32,
    /// Largest survivable horizontal impact speed
    pub max_land_vel_x: f32,
    /// Largest survivable vertical impact speed
    pub max_land_vel_y: f32,
    pub roll_mode: RollMode,
    /// Roll percentage above which the roll policy kicks in
    pub roll_threshold: f32,
    /// Penalty per tick in [`RollMode::Penalize`]
    pub roll_penalty: f32,
    /// Horizontal spacing between the two terrain scan probes
    pub scanner_spacing: f32,
    /// Friction coefficient of the hull
    pub friction: f32,
}

impl Default for LanderConfig {
    fn default() -> Self {
        Self {
            layout: ThrusterLayout::TwinFlame,
            sensors: SensorSuite::Standard,
            dry_mass: 626.0,
            max_fuel: 845.0,
            thrust: 800_000.0,
            consume_rate: 2.0,
            max_land_vel_x: 241.421,
            max_land_vel_y: 241.421,
            roll_mode: RollMode::Kill,
            roll_threshold: 0.5,
            roll_penalty: 100_000.0,
            scanner_spacing: 100.0,
            friction: 1.0,
        }
    }
}

impl LanderConfig {
    pub fn roll_policy(&self) -> RollPolicy {
        match self.roll_mode {
            RollMode::Kill => RollPolicy::Kill {
                threshold: self.roll_threshold,
            },
            RollMode::Penalize => RollPolicy::Penalize {
                threshold: self.roll_threshold,
                penalty: self.roll_penalty,
            },
        }
    }

    /// (inputs, outputs) a controller must have to fly this lander
    pub fn controller_shape(&self) -> (usize, usize) {
        (self.sensors.input_count(), self.layout.output_count())
    }
}

/// Why a lander was destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Touched the terrain too fast
    Speed,
    /// Rolled past the kill threshold
    Roll,
    /// Left the screen
    OutOfBounds,
}

/// Coarse lander state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanderStatus {
    Flying,
    Landed,
    Destroyed(DeathCause),
}

/// Snapshot used for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub distance: f32,
    pub velocity: f32,
    pub fitness: f32,
}

/// Shared, read-only episode state a lander flies against
#[derive(Clone, Copy)]
pub struct FlightContext<'a> {
    pub terrain: &'a TerrainProfile,
    pub landing_zone: LandingZone,
    pub fitness: &'a dyn FitnessFunction,
}

impl FlightContext<'_> {
    fn in_bounds(&self, position: Vec2) -> bool {
        (0.0..=self.terrain.width()).contains(&position.x)
            && (0.0..=self.terrain.height()).contains(&position.y)
    }
}

/// A lander flying one episode
pub struct Lander {
    genome: GenomeId,
    config: LanderConfig,
    controller: Box<dyn Controller>,

    body: RigidBodyHandle,
    fuel_span: ColliderHandle,
    released: bool,

    fuel: f32,
    alive: bool,
    has_collided: bool,
    death: Option<DeathCause>,

    angle: f32,
    position: Vec2,
    velocity: Vec2,
    abs_velocity: f32,
    distance_to_landing: f32,
    roll_percentage: f32,
    roll_penalty: f32,

    readings: SensorReadings,
    throttle: Throttle,
    applied_thrust: Vec2,
    fitness: f32,
}

impl Lander {
    /// Build the lander body with its fuel span centred on `position`.
    ///
    /// Fails when the controller does not match the configured sensor suite
    /// and thruster layout.
    pub fn spawn(
        genome: GenomeId,
        controller: Box<dyn Controller>,
        position: Vec2,
        config: &LanderConfig,
        physics: &mut PhysicsWorld,
        ctx: &FlightContext,
    ) -> Result<Self, LanderError> {
        let (expected_inputs, expected_outputs) = config.controller_shape();
        if controller.input_count() != expected_inputs
            || controller.output_count() != expected_outputs
        {
            return Err(LanderError::ControllerShape {
                expected_inputs,
                expected_outputs,
                inputs: controller.input_count(),
                outputs: controller.output_count(),
            });
        }

        let origin = position - fuel_span_center();
        let body = physics.insert_body(
            RigidBodyBuilder::dynamic()
                .translation(to_vector(origin))
                .build(),
        );

        let segment_mass = config.dry_mass / HULL_SEGMENTS.len() as f32;
        for (a, b) in HULL_SEGMENTS {
            physics.insert_collider(Self::segment(config, a, b, segment_mass), body);
        }
        let fuel_span = physics.insert_collider(
            Self::segment(config, FUEL_SPAN.0, FUEL_SPAN.1, config.max_fuel),
            body,
        );

        log::debug!(
            "Lander {}: spawned at ({:.1}, {:.1})",
            genome,
            position.x,
            position.y
        );

        let mut lander = Self {
            genome,
            config: config.clone(),
            controller,
            body,
            fuel_span,
            released: false,
            fuel: config.max_fuel,
            alive: true,
            has_collided: false,
            death: None,
            angle: 0.0,
            position,
            velocity: Vec2::ZERO,
            abs_velocity: 0.0,
            distance_to_landing: (ctx.landing_zone.position() - position).length(),
            roll_percentage: 0.0,
            roll_penalty: 0.0,
            readings: SensorReadings::default(),
            throttle: Throttle::OFF,
            applied_thrust: Vec2::ZERO,
            fitness: 0.0,
        };
        lander.fitness = ctx.fitness.evaluate(&lander.fitness_input());
        Ok(lander)
    }

    fn segment(config: &LanderConfig, a: Vec2, b: Vec2, mass: f32) -> Collider {
        ColliderBuilder::new(SharedShape::capsule(
            to_point(a),
            to_point(b),
            SEGMENT_RADIUS,
        ))
        .mass(mass)
        .friction(config.friction)
        .restitution(0.0)
        .collision_groups(Category::Lander.interaction_groups())
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build()
    }

    /// Advance one tick. Call once per physics step; dead landers ignore it.
    ///
    /// # Panics
    ///
    /// Panics if the lander's body was removed while the lander is alive.
    pub fn update(&mut self, physics: &mut PhysicsWorld, ctx: &FlightContext) {
        if !self.alive {
            return;
        }

        let Some(body) = physics.body(self.body) else {
            panic!("Lander {}: body removed while alive", self.genome);
        };

        self.angle = body.rotation().angle();
        self.position = from_point(&(body.position() * to_point(fuel_span_center())));
        self.distance_to_landing = (ctx.landing_zone.position() - self.position).length();

        let degrees = self.angle.to_degrees().rem_euclid(360.0);
        self.roll_percentage = degrees.min(360.0 - degrees) / 180.0;

        // Velocity freezes at first contact
        if !self.has_collided {
            self.velocity = from_vector(body.linvel());
            self.abs_velocity = self.velocity.length();
        }
        let angular_velocity = body.angvel();

        match self.config.roll_policy() {
            RollPolicy::Kill { threshold } if self.roll_percentage > threshold => {
                self.destroy(physics, DeathCause::Roll);
            }
            RollPolicy::Penalize { threshold, penalty } if self.roll_percentage > threshold => {
                self.roll_penalty += penalty;
            }
            _ => {}
        }

        if self.alive && !ctx.in_bounds(self.position) {
            self.destroy(physics, DeathCause::OutOfBounds);
        }

        self.fitness = ctx.fitness.evaluate(&self.fitness_input());

        if !self.alive {
            return;
        }
        if self.has_collided {
            self.cut_engines(physics);
            return;
        }

        self.readings = self.sense(physics, ctx, angular_velocity);
        let inputs = self.config.sensors.inputs(&self.readings);
        let outputs = self.controller.activate(&inputs);
        let mut throttle = self.config.layout.throttle(&outputs);

        if self.fuel > 0.0 {
            let burn = self.config.layout.fuel_burn(throttle, self.config.consume_rate);
            self.fuel = (self.fuel - burn).max(0.0);
            if let Some(fuel_span) = physics.collider_mut(self.fuel_span) {
                fuel_span.set_mass(self.fuel);
            }
        } else {
            throttle = Throttle::OFF;
        }

        self.throttle = throttle;
        self.apply_thrust(physics);
    }

    fn sense(
        &self,
        physics: &PhysicsWorld,
        ctx: &FlightContext,
        angular_velocity: f32,
    ) -> SensorReadings {
        let (left_scan, right_scan) = if self.config.sensors.scans() {
            sensors::terrain_scan(
                physics,
                self.position,
                self.config.scanner_spacing,
                ctx.terrain.height(),
            )
        } else {
            (SENSOR_MISS, SENSOR_MISS)
        };

        SensorReadings {
            altitude: sensors::altitude(ctx.terrain, self.position),
            left_scan,
            right_scan,
            deviation: ctx.landing_zone.position() - self.position,
            edge_distance: ctx.terrain.width() - self.position.x,
            position: self.position,
            velocity: self.velocity,
            angular_velocity,
            fuel: self.fuel,
        }
    }

    /// Replace last tick's engine forces with the current throttle's
    fn apply_thrust(&mut self, physics: &mut PhysicsWorld) {
        let forces = self
            .config
            .layout
            .forces(self.angle, self.config.thrust, self.throttle);

        let Some(body) = physics.body_mut(self.body) else {
            panic!("Lander {}: body removed while alive", self.genome);
        };
        body.reset_forces(true);

        let mut total = Vec2::ZERO;
        for engine in forces {
            if engine.force == Vec2::ZERO {
                continue;
            }
            let point = match engine.mount {
                Mount::Local(local) => body.position() * to_point(local),
                Mount::CenterOfMass => *body.center_of_mass(),
            };
            body.add_force_at_point(to_vector(engine.force), point, true);
            total += engine.force;
        }
        self.applied_thrust = total;
    }

    fn cut_engines(&mut self, physics: &mut PhysicsWorld) {
        self.throttle = Throttle::OFF;
        self.applied_thrust = Vec2::ZERO;
        if let Some(body) = physics.body_mut(self.body) {
            body.reset_forces(false);
        }
    }

    /// Handle first contact with the terrain. Later calls are no-ops.
    pub fn on_collision(&mut self, physics: &mut PhysicsWorld, ctx: &FlightContext) {
        if self.has_collided || !self.alive {
            return;
        }
        self.has_collided = true;

        let impact = self.velocity;
        if impact.x.abs() > self.config.max_land_vel_x || impact.y.abs() > self.config.max_land_vel_y
        {
            self.destroy(physics, DeathCause::Speed);
        } else {
            log::debug!(
                "Lander {}: landed at ({:.1}, {:.1}) with impact ({:.1}, {:.1})",
                self.genome,
                self.position.x,
                self.position.y,
                impact.x,
                impact.y
            );
            self.cut_engines(physics);
        }

        self.fitness = ctx.fitness.evaluate(&self.fitness_input());
    }

    /// Destroy the lander and release its body. Idempotent.
    pub fn destroy(&mut self, physics: &mut PhysicsWorld, cause: DeathCause) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.death = Some(cause);
        self.throttle = Throttle::OFF;
        self.applied_thrust = Vec2::ZERO;

        log::debug!(
            "Lander {}: destroyed ({:?}) at ({:.1}, {:.1})",
            self.genome,
            cause,
            self.position.x,
            self.position.y
        );
        self.release(physics);
    }

    /// Remove the body from the world without changing the lander's status.
    /// Safe to call any number of times.
    pub fn release(&mut self, physics: &mut PhysicsWorld) {
        if !self.released {
            physics.remove_body(self.body);
            self.released = true;
        }
    }

    fn fitness_input(&self) -> FitnessInput {
        FitnessInput {
            distance: self.distance_to_landing,
            velocity: self.abs_velocity,
            roll_penalty: self.roll_penalty,
            alive: self.alive,
            killed_by_roll: self.killed_by_roll(),
        }
    }

    /// (distance, velocity, fitness) snapshot
    pub fn evaluate(&self) -> Evaluation {
        Evaluation {
            distance: self.distance_to_landing,
            velocity: self.abs_velocity,
            fitness: self.fitness,
        }
    }

    pub fn status(&self) -> LanderStatus {
        match self.death {
            Some(cause) => LanderStatus::Destroyed(cause),
            None if self.has_collided => LanderStatus::Landed,
            None => LanderStatus::Flying,
        }
    }

    /// Still needs stepping: alive and not yet touched the terrain
    pub fn is_flying(&self) -> bool {
        self.alive && !self.has_collided
    }

    pub fn genome(&self) -> GenomeId {
        self.genome
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn has_collided(&self) -> bool {
        self.has_collided
    }

    pub fn death(&self) -> Option<DeathCause> {
        self.death
    }

    pub fn killed_by_roll(&self) -> bool {
        self.death == Some(DeathCause::Roll)
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    /// Current mass of the fuel-span collider, if the body still exists
    pub fn fuel_span_mass(&self, physics: &PhysicsWorld) -> Option<f32> {
        physics.collider(self.fuel_span).map(|collider| collider.mass())
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn roll_percentage(&self) -> f32 {
        self.roll_percentage
    }

    pub fn roll_penalty(&self) -> f32 {
        self.roll_penalty
    }

    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// Sum of the engine forces applied on the last tick
    pub fn applied_thrust(&self) -> Vec2 {
        self.applied_thrust
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}
