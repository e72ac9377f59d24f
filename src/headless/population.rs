//! Fixed-topology neuroevolution
//!
//! Each genome is the flat weight vector of a [`FeedForwardNetwork`].
//! Reproduction keeps the elite unchanged and fills the rest of the next
//! generation with tournament-selected, crossed-over, mutated children.

use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::training_env::TrainingConfig;
use crate::neural::{Controller, FeedForwardNetwork, GenomeId};

/// Supplies controllers for a generation and consumes their fitness
pub trait Trainer {
    /// Generations completed so far
    fn generation(&self) -> usize;

    /// One controller per genome of the current generation
    fn controllers(&self) -> Vec<(GenomeId, Box<dyn Controller>)>;

    /// Record fitness for the current generation and breed the next one
    fn report(&mut self, fitness: &[(GenomeId, f32)]);
}

/// Network weights plus the fitness they last scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: GenomeId,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
    pub weights: Vec<f32>,
    pub fitness: Option<f32>,
}

impl Genome {
    /// Random genome with weights in `[-0.5, 0.5)`
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        id: GenomeId,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
    ) -> Self {
        let network = FeedForwardNetwork::random(rng, input_dim, hidden_dim, output_dim);
        Self {
            id,
            input_dim,
            hidden_dim,
            output_dim,
            weights: network.weights().to_vec(),
            fitness: None,
        }
    }

    /// Perturb each weight with probability `rate` by up to `strength`
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: f32, strength: f32) {
        for weight in &mut self.weights {
            if rng.random::<f32>() < rate {
                // Triangular distribution centred on zero
                let delta = (rng.random::<f32>() - rng.random::<f32>()) * strength;
                *weight += delta;
            }
        }
    }

    /// Uniform crossover: each weight comes from either parent
    pub fn crossover<R: Rng + ?Sized>(rng: &mut R, id: GenomeId, a: &Genome, b: &Genome) -> Self {
        let weights = a
            .weights
            .iter()
            .zip(&b.weights)
            .map(|(&wa, &wb)| if rng.random_bool(0.5) { wa } else { wb })
            .collect();

        Self {
            id,
            input_dim: a.input_dim,
            hidden_dim: a.hidden_dim,
            output_dim: a.output_dim,
            weights,
            fitness: None,
        }
    }

    pub fn to_network(&self) -> FeedForwardNetwork {
        FeedForwardNetwork::from_weights(
            self.weights.clone(),
            self.input_dim,
            self.hidden_dim,
            self.output_dim,
        )
    }
}

/// Serialized population state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationCheckpoint {
    pub seed: u64,
    pub generation: usize,
    pub next_id: GenomeId,
    pub genomes: Vec<Genome>,
    pub best: Option<Genome>,
}

impl PopulationCheckpoint {
    /// Load a checkpoint from a RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint: {}", path.display()))?;

        let checkpoint = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON checkpoint: {}", path.display()))?;

        Ok(checkpoint)
    }

    /// Save the checkpoint to a RON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_ron(self, path.as_ref())
    }
}

impl Genome {
    /// Load a genome (e.g. `winner.ron`) from a RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read genome: {}", path.display()))?;

        let genome = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON genome: {}", path.display()))?;

        Ok(genome)
    }

    /// Save the genome to a RON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_ron(self, path.as_ref())
    }
}

fn write_ron<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let ron = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .context("Failed to serialize to RON")?;

    std::fs::write(path, ron).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Evolving population of network genomes
pub struct Population {
    config: TrainingConfig,
    seed: u64,
    generation: usize,
    next_id: GenomeId,
    genomes: Vec<Genome>,
    best: Option<Genome>,
}

impl Population {
    /// Random initial population for networks of the given shape
    pub fn new(config: &TrainingConfig, seed: u64, input_dim: usize, output_dim: usize) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let genomes = (0..config.population_size)
            .map(|i| {
                Genome::random(
                    &mut rng,
                    i as GenomeId,
                    input_dim,
                    config.hidden_dim,
                    output_dim,
                )
            })
            .collect();

        Self {
            config: config.clone(),
            seed,
            generation: 0,
            next_id: config.population_size as GenomeId,
            genomes,
            best: None,
        }
    }

    /// Restore from a checkpoint. Evolution parameters come from `config`.
    pub fn restore(config: &TrainingConfig, checkpoint: PopulationCheckpoint) -> Self {
        Self {
            config: config.clone(),
            seed: checkpoint.seed,
            generation: checkpoint.generation,
            next_id: checkpoint.next_id,
            genomes: checkpoint.genomes,
            best: checkpoint.best,
        }
    }

    pub fn checkpoint(&self) -> PopulationCheckpoint {
        PopulationCheckpoint {
            seed: self.seed,
            generation: self.generation,
            next_id: self.next_id,
            genomes: self.genomes.clone(),
            best: self.best.clone(),
        }
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Best genome seen across all reported generations
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Generator for breeding after `generation`, independent of history so
    /// a restored population breeds exactly like the original
    fn breeding_rng(&self) -> Xoshiro256PlusPlus {
        let mix = (self.generation as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Xoshiro256PlusPlus::seed_from_u64(self.seed ^ mix)
    }

    fn fresh_id(&mut self) -> GenomeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Pick the fittest of `tournament_size` random genomes
    fn tournament<'g, R: Rng + ?Sized>(&self, rng: &mut R, ranked: &'g [Genome]) -> &'g Genome {
        let mut winner: Option<&Genome> = None;
        for _ in 0..self.config.tournament_size.max(1) {
            let Some(candidate) = ranked.choose(rng) else {
                break;
            };
            if winner.map_or(true, |w| score(candidate) > score(w)) {
                winner = Some(candidate);
            }
        }
        winner.unwrap_or(&ranked[0])
    }
}

fn score(genome: &Genome) -> f32 {
    genome.fitness.unwrap_or(f32::NEG_INFINITY)
}

impl Trainer for Population {
    fn generation(&self) -> usize {
        self.generation
    }

    fn controllers(&self) -> Vec<(GenomeId, Box<dyn Controller>)> {
        self.genomes
            .iter()
            .map(|genome| {
                let controller: Box<dyn Controller> = Box::new(genome.to_network());
                (genome.id, controller)
            })
            .collect()
    }

    fn report(&mut self, fitness: &[(GenomeId, f32)]) {
        for genome in &mut self.genomes {
            genome.fitness = fitness
                .iter()
                .find(|(id, _)| *id == genome.id)
                .map(|&(_, value)| value);
        }

        let mut ranked = std::mem::take(&mut self.genomes);
        ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));

        if let Some(leader) = ranked.first().filter(|g| g.fitness.is_some()) {
            if self.best.as_ref().map_or(true, |best| score(leader) > score(best)) {
                log::debug!(
                    "Population: new best genome {} with fitness {:.2}",
                    leader.id,
                    score(leader)
                );
                self.best = Some(leader.clone());
            }
        }

        let mut rng = self.breeding_rng();
        let size = self.config.population_size;
        let mut next: Vec<Genome> = ranked
            .iter()
            .take(self.config.elitism.min(size))
            .cloned()
            .collect();

        while next.len() < size && !ranked.is_empty() {
            let a = self.tournament(&mut rng, &ranked);
            let b = self.tournament(&mut rng, &ranked);
            let id = self.fresh_id();
            let mut child = Genome::crossover(&mut rng, id, a, b);
            child.mutate(
                &mut rng,
                self.config.mutation_rate,
                self.config.mutation_strength,
            );
            next.push(child);
        }

        self.genomes = next;
        self.generation += 1;
    }
}
