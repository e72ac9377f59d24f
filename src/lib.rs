//! # Genetic Lander - neuroevolved 2D planetary landers
//!
//! Landers made of rigid hull segments and a fuel tank fly over procedurally
//! generated terrain. Neural controllers read their sensors and drive their
//! engines; a fitness score rewards ending up alive, slow and close to the
//! flattest spot of the terrain.

pub mod config;
pub mod episode;
pub mod error;
pub mod lander;
pub mod neural;
pub mod physics;
pub mod terrain;

// Headless training module
pub mod headless;

pub use config::SimulationConfig;
pub use episode::{EpisodeController, EpisodeSummary};
pub use error::LanderError;

/// Common imports for internal use
pub mod prelude {
    pub use crate::lander::{Lander, LanderConfig, ThrusterLayout};
    pub use crate::neural::{Controller, GenomeId};
    pub use crate::physics::PhysicsWorld;
    pub use crate::terrain::{LandingZone, TerrainProfile};
    pub use glam::Vec2;
}
