//! Simulation configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults (`#[serde(default)]` on every section)
//! 2. A RON file: the path given on the command line, or `lander.ron` if it exists
//! 3. Environment variables prefixed with `LANDER_`
//!
//! Example environment variable: `LANDER_TERRAIN__BREAK_COUNT=80`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::episode::EpisodeConfig;
use crate::error::LanderError;
use crate::headless::TrainingConfig;
use crate::lander::{FitnessConfig, LanderConfig};
use crate::terrain::TerrainConfig;

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub screen: ScreenConfig,
    pub physics: PhysicsConfig,
    pub terrain: TerrainConfig,
    pub lander: LanderConfig,
    pub fitness: FitnessConfig,
    pub episode: EpisodeConfig,
    pub training: TrainingConfig,
}

/// Simulated screen (the arena landers must stay inside)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Arena width in pixels
    pub width: f32,
    /// Arena height in pixels (+y points down)
    pub height: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Physics stepping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward gravity acceleration in pixels/sec^2 (lunar 1.625 m/s^2 at 100 px/m)
    pub gravity: f32,
    /// Simulation steps per simulated second
    pub fps: f32,
}

impl PhysicsConfig {
    /// Fixed timestep in seconds
    pub fn timestep(&self) -> f32 {
        1.0 / self.fps
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 162.5,
            fps: 24.0,
        }
    }
}

impl SimulationConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path` if given (must exist), otherwise `lander.ron` (optional)
    /// 3. Environment variables prefixed with `LANDER_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("lander")
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("LANDER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), LanderError> {
        let ScreenConfig { width, height } = self.screen;
        if !(width.is_finite() && height.is_finite() && width > 100.0 && height > 0.0) {
            return Err(LanderError::InvalidDimensions { width, height });
        }
        if self.physics.fps <= 0.0 {
            return Err(LanderError::InvalidConfig("physics.fps must be positive"));
        }
        if self.terrain.break_count < 2 {
            return Err(LanderError::TooFewBreaks(self.terrain.break_count));
        }
        if !(0.0..=1.0).contains(&self.terrain.base_fraction) {
            return Err(LanderError::InvalidConfig(
                "terrain.base_fraction must be within [0, 1]",
            ));
        }
        if self.lander.max_fuel < 0.0 || self.lander.dry_mass <= 0.0 {
            return Err(LanderError::InvalidConfig(
                "lander.dry_mass must be positive and lander.max_fuel non-negative",
            ));
        }
        if self.lander.consume_rate < 0.0 {
            return Err(LanderError::InvalidConfig(
                "lander.consume_rate must be non-negative",
            ));
        }
        if self.training.population_size == 0 {
            return Err(LanderError::InvalidConfig(
                "training.population_size must be at least 1",
            ));
        }
        if self.training.elitism > self.training.population_size {
            return Err(LanderError::InvalidConfig(
                "training.elitism cannot exceed training.population_size",
            ));
        }
        if self.training.tournament_size == 0 {
            return Err(LanderError::InvalidConfig(
                "training.tournament_size must be at least 1",
            ));
        }
        Ok(())
    }
}
