//! Procedural terrain: noise, surface profile and landing zone

pub mod landing_zone;
pub mod noise;
pub mod profile;

pub use landing_zone::{find_flattest_span, LandingZone};
pub use noise::NoiseGenerator;
pub use profile::{TerrainConfig, TerrainProfile};
