//! Lander entity and everything it is built from

#![allow(clippy::module_inception)]

pub mod fitness;
pub mod hull;
pub mod lander;
pub mod layout;
pub mod sensors;

pub use fitness::{FitnessConfig, FitnessFunction, FitnessInput, ProximityFitness};
pub use lander::{
    DeathCause, Evaluation, FlightContext, Lander, LanderConfig, LanderStatus, RollMode,
    RollPolicy,
};
pub use layout::{thrust_vector, Throttle, ThrusterLayout};
pub use sensors::{SensorReadings, SensorSuite, SENSOR_MISS};
