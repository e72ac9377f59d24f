//! Terrain surface polyline and its static collision geometry

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::noise::NoiseGenerator;
use crate::error::LanderError;
use crate::physics::{to_point, Category, PhysicsWorld};

/// Terrain generation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Number of noise samples (surface points) across the screen
    pub break_count: usize,
    /// Noise amplitude in pixels. Higher gives steeper variations
    pub exaggeration: f32,
    /// Minimum clearance between the surface and the bottom of the screen
    pub min_altitude: f32,
    /// Base surface height as a fraction of the screen height (0.5 to 0.8 recommended)
    pub base_fraction: f32,
    /// Friction coefficient of the ground colliders
    pub friction: f32,
    /// Minimum width of the landing zone span
    pub flat_span_width: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            break_count: 50,
            exaggeration: 200.0,
            min_altitude: 10.0,
            base_fraction: 0.8,
            friction: 0.9,
            flat_span_width: 100.0,
        }
    }
}

/// Ground surface as an x-monotonic polyline.
///
/// The first point sits at `x = 0` and the last at `x = width`. The ground
/// polygon is closed by the pinned corners `(0, height)` and `(width, height)`
/// (see [`polygon`](Self::polygon)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    points: Vec<Vec2>,
    width: f32,
    height: f32,
}

impl TerrainProfile {
    /// Build a profile from `config.break_count` noise samples.
    ///
    /// Each sample maps to `min(height - min_altitude, height * base_fraction
    /// + sample * exaggeration)`, floored at 0.
    pub fn generate(
        noise: &NoiseGenerator,
        config: &TerrainConfig,
        width: f32,
        height: f32,
    ) -> Result<Self, LanderError> {
        let count = config.break_count;
        if count < 2 {
            return Err(LanderError::TooFewBreaks(count));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(LanderError::InvalidDimensions { width, height });
        }

        let gap = width / (count - 1) as f32;
        let ceiling = height - config.min_altitude;

        let points = (0..count)
            .map(|i| {
                let u = i as f32 / (count - 1) as f32;
                let sample = noise.sample(u);
                let y = ceiling
                    .min(height * config.base_fraction + sample * config.exaggeration)
                    .max(0.0);
                // Pin the last point exactly to the right edge
                let x = if i == count - 1 { width } else { i as f32 * gap };
                Vec2::new(x, y)
            })
            .collect();

        Self::from_points(points, width, height)
    }

    /// Build a profile from explicit surface points.
    ///
    /// Points must be x-monotonic, start at `x = 0` and end at `x = width`.
    pub fn from_points(points: Vec<Vec2>, width: f32, height: f32) -> Result<Self, LanderError> {
        if points.len() < 2 {
            return Err(LanderError::TooFewBreaks(points.len()));
        }
        let monotonic = points.windows(2).all(|pair| pair[1].x > pair[0].x);
        let pinned = points[0].x == 0.0 && points[points.len() - 1].x == width;
        if !monotonic || !pinned {
            return Err(LanderError::InvalidConfig(
                "terrain points must be x-monotonic from 0 to width",
            ));
        }

        Ok(Self {
            points,
            width,
            height,
        })
    }

    /// Surface points, left to right
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Adjacent surface point pairs
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Closed ground polygon: pinned bottom-left corner, surface, pinned
    /// bottom-right corner
    pub fn polygon(&self) -> Vec<Vec2> {
        let mut polygon = Vec::with_capacity(self.points.len() + 2);
        polygon.push(Vec2::new(0.0, self.height));
        polygon.extend_from_slice(&self.points);
        polygon.push(Vec2::new(self.width, self.height));
        polygon
    }

    /// Surface height at `x`, linearly interpolated between the two bracketing
    /// points. `None` outside the terrain's horizontal domain.
    pub fn height_at(&self, x: f32) -> Option<f32> {
        self.segments().find_map(|(a, b)| {
            if a.x <= x && x <= b.x {
                let t = (x - a.x) / (b.x - a.x);
                Some(a.y + t * (b.y - a.y))
            } else {
                None
            }
        })
    }

    /// Axis-aligned bounding box of the surface points
    pub fn bounds(&self) -> (Vec2, Vec2) {
        self.points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        )
    }

    /// Create the static ground body: one convex quad per surface segment,
    /// extended down to the bottom of the screen.
    pub fn spawn_colliders(&self, physics: &mut PhysicsWorld, friction: f32) -> RigidBodyHandle {
        let body = physics.insert_body(RigidBodyBuilder::fixed().build());
        let mut quads = 0;

        for (a, b) in self.segments() {
            let quad = vec![
                to_point(a),
                to_point(b),
                point![b.x, self.height],
                point![a.x, self.height],
            ];

            let Some(builder) = ColliderBuilder::convex_polyline(quad) else {
                log::warn!(
                    "Terrain: skipping degenerate segment ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                    a.x,
                    a.y,
                    b.x,
                    b.y
                );
                continue;
            };

            let collider = builder
                .friction(friction)
                .restitution(0.0)
                .collision_groups(Category::Terrain.interaction_groups())
                .build();
            physics.insert_collider(collider, body);
            quads += 1;
        }

        log::debug!("Terrain: created {} ground colliders", quads);
        body
    }
}
