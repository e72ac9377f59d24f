//! Thruster layouts: engine mounts, throttle mapping and thrust vectors

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hull::{fuel_span_center, FUEL_SPAN};

/// Engine arrangement of a lander
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrusterLayout {
    /// Two engines at the fuel-span endpoints
    #[default]
    TwinFlame,
    /// Main engine at the fuel-span centre plus two lateral thrusters at the
    /// centre of mass
    PulseRocker,
}

impl std::str::FromStr for ThrusterLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twin-flame" | "twinflame" | "tfc" => Ok(ThrusterLayout::TwinFlame),
            "pulse-rocker" | "pulserocker" | "pr" => Ok(ThrusterLayout::PulseRocker),
            other => Err(format!(
                "Unknown thruster layout '{}', expected twin-flame or pulse-rocker",
                other
            )),
        }
    }
}

/// Where an engine force is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mount {
    /// Body-local point, transformed to world space at application time
    Local(Vec2),
    /// The body's centre of mass
    CenterOfMass,
}

/// One world-frame engine force
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineForce {
    pub force: Vec2,
    pub mount: Mount,
}

/// Engine throttles in `[0, 1]`. Unused engines of a layout stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Throttle {
    pub left: f32,
    pub right: f32,
    pub main: f32,
}

impl Throttle {
    pub const OFF: Throttle = Throttle {
        left: 0.0,
        right: 0.0,
        main: 0.0,
    };

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

impl ThrusterLayout {
    /// Number of controller outputs this layout reads
    pub fn output_count(self) -> usize {
        match self {
            ThrusterLayout::TwinFlame => 2,
            ThrusterLayout::PulseRocker => 3,
        }
    }

    /// Thrust the layout was tuned with
    pub fn nominal_thrust(self) -> f32 {
        match self {
            ThrusterLayout::TwinFlame => 800_000.0,
            ThrusterLayout::PulseRocker => 900_000.0,
        }
    }

    /// Short tag used in run folder names
    pub fn tag(self) -> &'static str {
        match self {
            ThrusterLayout::TwinFlame => "L-TFC",
            ThrusterLayout::PulseRocker => "L-PR",
        }
    }

    /// Map raw controller outputs to throttles.
    ///
    /// Output order is `[left, right]` or `[left, right, main]`. Missing
    /// outputs read as idle.
    pub fn throttle(self, outputs: &[f32]) -> Throttle {
        let read = |i: usize| outputs.get(i).copied().map_or(0.0, throttle_from_output);
        match self {
            ThrusterLayout::TwinFlame => Throttle {
                left: read(0),
                right: read(1),
                main: 0.0,
            },
            ThrusterLayout::PulseRocker => Throttle {
                left: read(0),
                right: read(1),
                main: read(2),
            },
        }
    }

    /// Fuel burnt by one tick at `throttle`
    pub fn fuel_burn(self, throttle: Throttle, consume_rate: f32) -> f32 {
        match self {
            ThrusterLayout::TwinFlame => (throttle.left + throttle.right) * consume_rate,
            ThrusterLayout::PulseRocker => {
                throttle.main * consume_rate + (throttle.left + throttle.right) * consume_rate / 2.0
            }
        }
    }

    /// World-frame engine forces for a craft at `angle` radians
    pub fn forces(self, angle: f32, thrust: f32, throttle: Throttle) -> Vec<EngineForce> {
        let v = thrust_vector(angle, thrust);
        match self {
            ThrusterLayout::TwinFlame => vec![
                EngineForce {
                    force: v * throttle.left,
                    mount: Mount::Local(FUEL_SPAN.0),
                },
                EngineForce {
                    force: v * throttle.right,
                    mount: Mount::Local(FUEL_SPAN.1),
                },
            ],
            ThrusterLayout::PulseRocker => vec![
                EngineForce {
                    force: v * throttle.main,
                    mount: Mount::Local(fuel_span_center()),
                },
                EngineForce {
                    force: Vec2::new(v.y / 2.0, -v.x / 2.0) * throttle.right,
                    mount: Mount::CenterOfMass,
                },
                EngineForce {
                    force: Vec2::new(-v.y / 2.0, v.x / 2.0) * throttle.left,
                    mount: Mount::CenterOfMass,
                },
            ],
        }
    }
}

/// Map a controller output in `[-1, 1]` to a throttle in `[0, 1]`.
/// NaN reads as idle.
pub fn throttle_from_output(output: f32) -> f32 {
    if output.is_nan() {
        return 0.0;
    }
    ((output + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Full-throttle thrust for a craft at `angle` radians.
///
/// The sign flips with the side of upright the craft faces, so the vertical
/// component never points down the screen.
pub fn thrust_vector(angle: f32, thrust: f32) -> Vec2 {
    let degrees = angle.to_degrees().rem_euclid(360.0);
    let force = if degrees > 270.0 || degrees < 90.0 {
        -thrust
    } else {
        thrust
    };
    Vec2::new(force * (-angle).sin(), force * (-angle).cos())
}
