//! Headless training environment for lander evolution
//!
//! This module provides infrastructure for evolving landers offline without GUI:
//! - A fixed-topology neuroevolution trainer
//! - An append-only fitness log
//! - Training runs with checkpoints, resume and a saved winner

mod fitness_log;
mod population;
mod training_env;

pub use fitness_log::FitnessLog;
pub use population::{Genome, Population, PopulationCheckpoint, Trainer};
pub use training_env::{TrainingConfig, TrainingRun, TrainingStats};
