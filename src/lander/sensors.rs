//! Sensor readings fed to lander controllers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::{Category, PhysicsWorld};
use crate::terrain::TerrainProfile;

/// Reading reported when a sensor finds no terrain
pub const SENSOR_MISS: f32 = 1e8;

/// Which readings a lander exposes to its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorSuite {
    /// altitude, x/y deviation, velocity, angular velocity, fuel
    #[default]
    Standard,
    /// Standard plus terrain scanners, screen edge distance and position
    Extended,
}

/// Everything a lander can sense in one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    /// Vertical distance to the terrain directly below
    pub altitude: f32,
    /// Nearest terrain distance from the left scan probe
    pub left_scan: f32,
    /// Nearest terrain distance from the right scan probe
    pub right_scan: f32,
    /// Landing zone minus position
    pub deviation: Vec2,
    /// Distance to the right screen edge
    pub edge_distance: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub fuel: f32,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            altitude: SENSOR_MISS,
            left_scan: SENSOR_MISS,
            right_scan: SENSOR_MISS,
            deviation: Vec2::ZERO,
            edge_distance: 0.0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            fuel: 0.0,
        }
    }
}

impl SensorSuite {
    /// Number of controller inputs
    pub fn input_count(self) -> usize {
        match self {
            SensorSuite::Standard => 7,
            SensorSuite::Extended => 12,
        }
    }

    /// Whether this suite uses the terrain scanners
    pub fn scans(self) -> bool {
        matches!(self, SensorSuite::Extended)
    }

    /// Flatten readings into a controller input vector
    pub fn inputs(self, r: &SensorReadings) -> Vec<f32> {
        match self {
            SensorSuite::Standard => vec![
                r.altitude,
                r.deviation.x,
                r.deviation.y,
                r.velocity.x,
                r.velocity.y,
                r.angular_velocity,
                r.fuel,
            ],
            SensorSuite::Extended => vec![
                r.altitude,
                r.left_scan,
                r.right_scan,
                r.deviation.x,
                r.deviation.y,
                r.edge_distance,
                r.position.x,
                r.position.y,
                r.velocity.x,
                r.velocity.y,
                r.angular_velocity,
                r.fuel,
            ],
        }
    }
}

/// Vertical distance from `position` to the surface below or above it
pub fn altitude(terrain: &TerrainProfile, position: Vec2) -> f32 {
    terrain
        .height_at(position.x)
        .map_or(SENSOR_MISS, |y| (position.y - y).abs())
}

/// Nearest terrain distances from two probes `spacing / 2` to either side
/// of `position`. Misses and readings beyond `range` report [`SENSOR_MISS`].
pub fn terrain_scan(physics: &PhysicsWorld, position: Vec2, spacing: f32, range: f32) -> (f32, f32) {
    let probe = |dx: f32| {
        physics
            .nearest_distance(position + Vec2::new(dx, 0.0), Category::Terrain)
            .filter(|distance| *distance <= range)
            .unwrap_or(SENSOR_MISS)
    };
    (probe(-spacing / 2.0), probe(spacing / 2.0))
}
