//! Fitness functions for scoring lander flights
//!
//! Higher is better. Scoring is a separate unit so the trainer can be run
//! against different objectives without touching the lander update.

use serde::{Deserialize, Serialize};

/// Lander state a fitness function can look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessInput {
    /// Distance from the lander to the landing zone
    pub distance: f32,
    /// Speed, frozen at first contact
    pub velocity: f32,
    /// Accumulated roll penalty
    pub roll_penalty: f32,
    pub alive: bool,
    pub killed_by_roll: bool,
}

/// Trait for lander fitness evaluation
pub trait FitnessFunction: Send + Sync {
    /// Score one lander state
    fn evaluate(&self, input: &FitnessInput) -> f32;

    /// Get the name of this fitness function
    fn name(&self) -> &str;

    /// Get a description of what this fitness measures
    fn description(&self) -> &str;
}

/// Weights of [`ProximityFitness`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Upper bound of the miss cost
    pub proximity_scale: f32,
    /// How quickly the miss cost saturates with distance and speed
    pub proximity_decay: f32,
    /// Bonus for being alive
    pub alive_bonus: f32,
    /// Subtracted from landers killed by rolling over
    pub roll_kill_penalty: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            proximity_scale: 500.0,
            proximity_decay: 0.01,
            alive_bonus: 2000.0,
            roll_kill_penalty: 1e9,
        }
    }
}

/// Rewards ending near the landing zone at low speed.
///
/// `alive_bonus - scale * (1 - exp(-decay * sqrt(d^2 + v^2))) - roll_penalty`,
/// minus `roll_kill_penalty` when the lander rolled over.
#[derive(Debug, Clone, Default)]
pub struct ProximityFitness {
    pub config: FitnessConfig,
}

impl ProximityFitness {
    pub fn new(config: FitnessConfig) -> Self {
        Self { config }
    }

    /// Miss cost in `[0, proximity_scale)`
    pub fn miss_cost(&self, distance: f32, velocity: f32) -> f32 {
        let magnitude = (distance * distance + velocity * velocity).sqrt();
        self.config.proximity_scale * (1.0 - (-self.config.proximity_decay * magnitude).exp())
    }
}

impl FitnessFunction for ProximityFitness {
    fn evaluate(&self, input: &FitnessInput) -> f32 {
        let mut fitness = -self.miss_cost(input.distance, input.velocity) - input.roll_penalty;
        if input.alive {
            fitness += self.config.alive_bonus;
        }
        if input.killed_by_roll {
            fitness -= self.config.roll_kill_penalty;
        }
        fitness
    }

    fn name(&self) -> &str {
        "Proximity"
    }

    fn description(&self) -> &str {
        "Rewards ending alive, close to the landing zone and slow"
    }
}
