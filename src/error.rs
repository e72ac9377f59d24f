//! Error types for simulation setup
//!
//! Per-tick simulation never fails: sensor misses return a sentinel, throttles
//! are clamped and teardown is idempotent. Only setup can be rejected.

use thiserror::Error;

/// Errors raised while building terrain, validating configuration or
/// spawning landers.
#[derive(Debug, Error, PartialEq)]
pub enum LanderError {
    /// Terrain needs at least two break points to form a surface.
    #[error("terrain needs at least 2 break points, got {0}")]
    TooFewBreaks(usize),

    /// Screen dimensions must be positive and finite.
    #[error("invalid screen dimensions {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    /// Controller does not match the lander's sensor/thruster shape.
    #[error(
        "controller shape {inputs}->{outputs} does not match lander shape {expected_inputs}->{expected_outputs}"
    )]
    ControllerShape {
        expected_inputs: usize,
        expected_outputs: usize,
        inputs: usize,
        outputs: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
