//! Layered coherent noise for terrain profiles

use noise::{NoiseFn, Perlin};
use rand::Rng;

/// (frequency, weight) of each octave band
const BANDS: [(f64, f64); 3] = [(1.0, 1.0), (4.0, 0.7), (32.0, 0.1)];

/// Three Perlin bands with independent seeds, drawn once at construction.
///
/// Each terrain build gets its own generator, so episodes never share noise
/// state and a fixed seed reproduces a terrain exactly.
#[derive(Clone)]
pub struct NoiseGenerator {
    seeds: [u32; 3],
    bands: [Perlin; 3],
}

impl NoiseGenerator {
    /// Draw fresh band seeds from `rng`
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_seeds([rng.random(), rng.random(), rng.random()])
    }

    /// Build from explicit band seeds
    pub fn from_seeds(seeds: [u32; 3]) -> Self {
        Self {
            seeds,
            bands: seeds.map(Perlin::new),
        }
    }

    /// Band seeds this generator was built from
    pub fn seeds(&self) -> [u32; 3] {
        self.seeds
    }

    /// Sample the 1D projection of the layered noise at `(u, 0)`
    pub fn sample(&self, u: f32) -> f32 {
        let u = u as f64;
        self.bands
            .iter()
            .zip(BANDS)
            .map(|(perlin, (frequency, weight))| weight * perlin.get([u * frequency, 0.0]))
            .sum::<f64>() as f32
    }
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("seeds", &self.seeds)
            .finish()
    }
}
