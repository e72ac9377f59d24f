//! Training run for lander evolution
//!
//! Main generation loop: one episode per generation, fitness log row,
//! trainer update and periodic checkpoints.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::fitness_log::FitnessLog;
use super::population::{Genome, Population, PopulationCheckpoint, Trainer};
use crate::config::SimulationConfig;
use crate::episode::EpisodeController;
use crate::lander::ProximityFitness;
use crate::physics::PhysicsWorld;

/// Configuration for the training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of generations to run
    pub generations: usize,
    /// Population size per generation
    pub population_size: usize,
    /// Hidden layer width of the controller networks
    pub hidden_dim: usize,
    /// Probability of perturbing each weight of a child
    pub mutation_rate: f32,
    /// Largest weight perturbation
    pub mutation_strength: f32,
    /// Best genomes copied unchanged into the next generation
    pub elitism: usize,
    /// Genomes competing per parent selection
    pub tournament_size: usize,
    /// How often to save checkpoints (every N generations, 0 = never)
    pub checkpoint_interval: usize,
    /// Parent directory of run folders
    pub output_dir: String,
    /// Seed for evolution and terrain. Random when unset.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            population_size: 50,
            hidden_dim: 8,
            mutation_rate: 0.2,
            mutation_strength: 0.5,
            elitism: 2,
            tournament_size: 3,
            checkpoint_interval: 10,
            output_dir: "runs".to_string(),
            seed: None,
        }
    }
}

/// Statistics of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStats {
    pub generation: usize,
    /// Best fitness this generation
    pub best_fitness: f32,
    /// Average fitness this generation
    pub avg_fitness: f32,
    pub landed: usize,
    pub ticks: usize,
}

/// A training run writing into its own folder
pub struct TrainingRun {
    config: SimulationConfig,
    population: Population,
    physics: PhysicsWorld,
    fitness: ProximityFitness,
    seed: u64,
    run_dir: PathBuf,
    log: FitnessLog,
    /// Statistics history
    pub stats_history: Vec<TrainingStats>,
}

impl TrainingRun {
    /// Start a fresh run in `<output_dir>/<timestamp>-<layout tag>`
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = config
            .training
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let (inputs, outputs) = config.lander.controller_shape();
        let population = Population::new(&config.training, seed, inputs, outputs);

        let run_dir = Path::new(&config.training.output_dir).join(format!(
            "{}-{}",
            chrono::Local::now().format("%Y%m%d-%H%M%S"),
            config.lander.layout.tag()
        ));

        log::info!("Training run: seed {} in {}", seed, run_dir.display());
        Self::with_population(config, population, seed, run_dir)
    }

    /// Continue a run from a checkpoint, writing next to it
    pub fn resume(config: SimulationConfig, checkpoint: &Path) -> Result<Self> {
        let saved = PopulationCheckpoint::from_file(checkpoint)?;
        let seed = saved.seed;
        let generation = saved.generation;
        let population = Population::restore(&config.training, saved);

        let run_dir = checkpoint
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        log::info!(
            "Resuming training from {} at generation {}",
            checkpoint.display(),
            generation
        );
        Self::with_population(config, population, seed, run_dir)
    }

    fn with_population(
        config: SimulationConfig,
        population: Population,
        seed: u64,
        run_dir: PathBuf,
    ) -> Result<Self> {
        std::fs::create_dir_all(&run_dir).with_context(|| {
            format!("Failed to create run directory: {}", run_dir.display())
        })?;

        Ok(Self {
            physics: PhysicsWorld::new(&config.physics),
            fitness: ProximityFitness::new(config.fitness.clone()),
            log: FitnessLog::new(run_dir.join("fitness.csv")),
            config,
            population,
            seed,
            run_dir,
            stats_history: Vec::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Create a progress bar style
    fn progress_style() -> Result<ProgressStyle> {
        Ok(ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"))
    }

    /// Run until `training.generations` generations are complete.
    ///
    /// Returns the best genome seen, also written to `winner.ron`.
    pub fn run(&mut self) -> Result<Option<Genome>> {
        let total = self.config.training.generations;
        let start = self.population.generation();

        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::progress_style()?);
        pb.set_position(start.min(total) as u64);

        pb.println(format!(
            "Starting training: generations {}..{}, population {}",
            start, total, self.config.training.population_size
        ));

        while self.population.generation() < total {
            let stats = self.run_generation()?;

            pb.println(format!(
                "Gen {}: best={:.2}, avg={:.2}, landed={}, ticks={}",
                stats.generation, stats.best_fitness, stats.avg_fitness, stats.landed, stats.ticks
            ));
            self.stats_history.push(stats);
            pb.inc(1);

            let interval = self.config.training.checkpoint_interval;
            if interval > 0 && self.population.generation() % interval == 0 {
                let path = self.save_checkpoint()?;
                pb.println(format!("Saved checkpoint {}", path.display()));
            }
        }

        let winner = self.population.best().cloned();
        if let Some(genome) = &winner {
            let path = self.run_dir.join("winner.ron");
            genome.to_file(&path)?;
            log::info!(
                "Winner: genome {} with fitness {:.2} saved to {}",
                genome.id,
                genome.fitness.unwrap_or(f32::NAN),
                path.display()
            );
        }

        pb.finish_with_message("Training complete!");
        Ok(winner)
    }

    /// Evaluate the current generation in one episode and breed the next
    fn run_generation(&mut self) -> Result<TrainingStats> {
        let generation = self.population.generation();

        // Terrain and spawns depend only on seed and generation
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed ^ generation as u64);
        let controller = EpisodeController::new(&self.config, &self.fitness);
        let summary = controller
            .run(&mut self.physics, self.population.controllers(), &mut rng)
            .with_context(|| format!("Failed to run episode for generation {}", generation))?;

        self.log.append(generation, &summary)?;
        self.population.report(&summary.fitness());

        let stats = TrainingStats {
            generation,
            best_fitness: summary
                .best()
                .map_or(0.0, |best| best.evaluation.fitness),
            avg_fitness: summary.avg_fitness,
            landed: summary.landed,
            ticks: summary.ticks,
        };

        log::info!(
            "Generation {}: best={:.2} avg={:.2} landed={} crashed={} roll_killed={} out_of_bounds={}",
            generation,
            stats.best_fitness,
            stats.avg_fitness,
            summary.landed,
            summary.crashed,
            summary.roll_killed,
            summary.out_of_bounds
        );
        Ok(stats)
    }

    /// Save the population as `ckpt-<generation>.ron`
    pub fn save_checkpoint(&self) -> Result<PathBuf> {
        let path = self
            .run_dir
            .join(format!("ckpt-{}.ron", self.population.generation()));
        self.population.checkpoint().to_file(&path)?;
        Ok(path)
    }
}
