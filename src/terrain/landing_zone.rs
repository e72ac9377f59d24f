//! Landing zone search: the flattest span of the terrain

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::profile::TerrainProfile;

/// Target point on the terrain surface, fixed for one episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingZone {
    pub x: f32,
    pub y: f32,
}

impl LandingZone {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Midpoint of the window of consecutive surface points with the smallest
/// summed absolute slope among all windows at least `width` wide.
///
/// Ties keep the lowest start index. When no window is wide enough, a point
/// drawn uniformly from the surface bounding box is returned instead.
pub fn find_flattest_span<R: Rng + ?Sized>(
    profile: &TerrainProfile,
    width: f32,
    rng: &mut R,
) -> LandingZone {
    let points = profile.points();
    let mut best: Option<(f32, usize, usize)> = None;

    for start in 0..points.len() {
        let mut slope_sum = 0.0;
        for end in (start + 1)..points.len() {
            let (a, b) = (points[end - 1], points[end]);
            let dx = b.x - a.x;
            if dx != 0.0 {
                slope_sum += ((b.y - a.y) / dx).abs();
            }

            if points[end].x - points[start].x >= width {
                if best.map_or(true, |(min, _, _)| slope_sum < min) {
                    best = Some((slope_sum, start, end));
                }
                // Longer windows from this start only add slope
                break;
            }
        }
    }

    match best {
        Some((_, start, end)) => {
            let x = (points[start].x + points[end].x) / 2.0;
            let y = profile.height_at(x).unwrap_or(points[start].y);
            LandingZone { x, y }
        }
        None => {
            let (min, max) = profile.bounds();
            log::warn!(
                "Terrain: no span of width {:.1} found, picking a random landing zone",
                width
            );
            LandingZone {
                x: sample_between(rng, min.x, max.x),
                y: sample_between(rng, min.y, max.y),
            }
        }
    }
}

fn sample_between<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}
