//! Episode driver: one generation's flight from spawn to all-terminal
//!
//! An episode builds fresh terrain, spawns one lander per controller, then
//! steps physics and landers until every lander is dead or has touched the
//! ground. Physics bodies are released when the episode ends, including on
//! early return or panic.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::LanderError;
use crate::lander::{
    DeathCause, Evaluation, FitnessFunction, FlightContext, Lander, LanderStatus,
};
use crate::neural::{Controller, GenomeId};
use crate::physics::PhysicsWorld;
use crate::terrain::{find_flattest_span, LandingZone, NoiseGenerator, TerrainProfile};

/// Spawn placement and safety limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Spawn height (distance from the top of the screen)
    pub spawn_y: f32,
    /// Keep spawns this far from the left and right screen edges
    pub spawn_margin: f32,
    /// No spawns within this horizontal distance of the landing zone
    pub no_spawn_margin_x: f32,
    /// Give up on landers still flying after this many ticks
    pub max_ticks: usize,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            spawn_y: 100.0,
            spawn_margin: 50.0,
            no_spawn_margin_x: 500.0,
            max_ticks: 20_000,
        }
    }
}

/// One lander to place in an episode
pub struct Spawn {
    pub genome: GenomeId,
    pub controller: Box<dyn Controller>,
    pub position: Vec2,
}

/// Final state of one lander
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanderResult {
    pub genome: GenomeId,
    pub status: LanderStatus,
    pub has_collided: bool,
    pub fuel: f32,
    pub evaluation: Evaluation,
}

/// Aggregated outcome of an episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub landing_zone: LandingZone,
    /// Physics steps taken
    pub ticks: usize,
    /// Stopped by the tick limit with landers still flying
    pub timed_out: bool,
    pub avg_distance: f32,
    pub avg_velocity: f32,
    pub avg_fitness: f32,
    pub landed: usize,
    pub crashed: usize,
    pub roll_killed: usize,
    pub out_of_bounds: usize,
    pub results: Vec<LanderResult>,
}

impl EpisodeSummary {
    fn from_results(
        landing_zone: LandingZone,
        ticks: usize,
        timed_out: bool,
        results: Vec<LanderResult>,
    ) -> Self {
        let count = |status: LanderStatus| results.iter().filter(|r| r.status == status).count();
        let average = |value: fn(&Evaluation) -> f32| {
            if results.is_empty() {
                0.0
            } else {
                results.iter().map(|r| value(&r.evaluation)).sum::<f32>() / results.len() as f32
            }
        };

        Self {
            landing_zone,
            ticks,
            timed_out,
            avg_distance: average(|e| e.distance),
            avg_velocity: average(|e| e.velocity),
            avg_fitness: average(|e| e.fitness),
            landed: count(LanderStatus::Landed),
            crashed: count(LanderStatus::Destroyed(DeathCause::Speed)),
            roll_killed: count(LanderStatus::Destroyed(DeathCause::Roll)),
            out_of_bounds: count(LanderStatus::Destroyed(DeathCause::OutOfBounds)),
            results,
        }
    }

    /// Final fitness per genome, for the trainer
    pub fn fitness(&self) -> Vec<(GenomeId, f32)> {
        self.results
            .iter()
            .map(|r| (r.genome, r.evaluation.fitness))
            .collect()
    }

    /// Best result of the episode
    pub fn best(&self) -> Option<&LanderResult> {
        self.results
            .iter()
            .max_by(|a, b| a.evaluation.fitness.total_cmp(&b.evaluation.fitness))
    }
}

/// Physics resources owned by a running episode, released on drop
struct Episode<'w> {
    physics: &'w mut PhysicsWorld,
    terrain_body: rapier2d::prelude::RigidBodyHandle,
    landers: Vec<Lander>,
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        for lander in &mut self.landers {
            lander.release(self.physics);
        }
        self.physics.remove_body(self.terrain_body);
    }
}

/// Runs episodes against a simulation configuration and fitness function
pub struct EpisodeController<'a> {
    config: &'a SimulationConfig,
    fitness: &'a dyn FitnessFunction,
}

impl<'a> EpisodeController<'a> {
    pub fn new(config: &'a SimulationConfig, fitness: &'a dyn FitnessFunction) -> Self {
        Self { config, fitness }
    }

    /// Build fresh terrain from new noise seeds and locate its landing zone
    pub fn generate_terrain<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(TerrainProfile, LandingZone), LanderError> {
        let noise = NoiseGenerator::new(rng);
        let screen = &self.config.screen;
        let terrain =
            TerrainProfile::generate(&noise, &self.config.terrain, screen.width, screen.height)?;
        let zone = find_flattest_span(&terrain, self.config.terrain.flat_span_width, rng);

        log::debug!(
            "Episode: terrain seeds {:?}, landing zone ({:.1}, {:.1})",
            noise.seeds(),
            zone.x,
            zone.y
        );
        Ok((terrain, zone))
    }

    /// Run one episode on fresh terrain with one lander per controller
    pub fn run<R: Rng + ?Sized>(
        &self,
        physics: &mut PhysicsWorld,
        population: Vec<(GenomeId, Box<dyn Controller>)>,
        rng: &mut R,
    ) -> Result<EpisodeSummary, LanderError> {
        let (terrain, zone) = self.generate_terrain(rng)?;
        let episode = &self.config.episode;

        let spawns = population
            .into_iter()
            .map(|(genome, controller)| {
                let x = sample_spawn_x(
                    rng,
                    self.config.screen.width,
                    episode.spawn_margin,
                    zone.x,
                    episode.no_spawn_margin_x,
                );
                Spawn {
                    genome,
                    controller,
                    position: Vec2::new(x, episode.spawn_y),
                }
            })
            .collect();

        self.fly(physics, &terrain, zone, spawns)
    }

    /// Fly the given landers over `terrain` until all are terminal
    pub fn fly(
        &self,
        physics: &mut PhysicsWorld,
        terrain: &TerrainProfile,
        landing_zone: LandingZone,
        spawns: Vec<Spawn>,
    ) -> Result<EpisodeSummary, LanderError> {
        let ctx = FlightContext {
            terrain,
            landing_zone,
            fitness: self.fitness,
        };

        let terrain_body = terrain.spawn_colliders(physics, self.config.terrain.friction);
        let mut episode = Episode {
            physics,
            terrain_body,
            landers: Vec::with_capacity(spawns.len()),
        };

        for spawn in spawns {
            let lander = Lander::spawn(
                spawn.genome,
                spawn.controller,
                spawn.position,
                &self.config.lander,
                episode.physics,
                &ctx,
            )?;
            episode.landers.push(lander);
        }

        let by_body: HashMap<_, _> = episode
            .landers
            .iter()
            .enumerate()
            .map(|(index, lander)| (lander.body(), index))
            .collect();

        let max_ticks = self.config.episode.max_ticks;
        let mut ticks = 0;

        while episode.landers.iter().any(Lander::is_flying) && ticks < max_ticks {
            let events = episode.physics.step();
            ticks += 1;

            for event in events {
                if let Some(&index) = by_body.get(&event.lander) {
                    episode.landers[index].on_collision(episode.physics, &ctx);
                }
            }

            for lander in &mut episode.landers {
                lander.update(episode.physics, &ctx);
            }
        }

        let timed_out = episode.landers.iter().any(Lander::is_flying);
        if timed_out {
            log::warn!(
                "Episode: stopped after {} ticks with {} landers still flying",
                ticks,
                episode.landers.iter().filter(|l| l.is_flying()).count()
            );
        }

        let results = episode
            .landers
            .iter()
            .map(|lander| LanderResult {
                genome: lander.genome(),
                status: lander.status(),
                has_collided: lander.has_collided(),
                fuel: lander.fuel(),
                evaluation: lander.evaluate(),
            })
            .collect();

        let summary = EpisodeSummary::from_results(landing_zone, ticks, timed_out, results);
        log::info!(
            "Episode: {} ticks, avg fitness {:.2}, landed {}, crashed {}, roll killed {}, out of bounds {}",
            summary.ticks,
            summary.avg_fitness,
            summary.landed,
            summary.crashed,
            summary.roll_killed,
            summary.out_of_bounds
        );
        Ok(summary)
    }
}

/// Uniform spawn x in `[margin, width - margin]`, excluding
/// `[target - exclusion, target + exclusion]`.
///
/// Falls back to the whole range when the exclusion band covers it.
pub fn sample_spawn_x<R: Rng + ?Sized>(
    rng: &mut R,
    width: f32,
    margin: f32,
    target: f32,
    exclusion: f32,
) -> f32 {
    let (low, high) = (margin, width - margin);
    if high <= low {
        return width / 2.0;
    }

    let left = (low, high.min(target - exclusion));
    let right = (low.max(target + exclusion), high);
    let left_len = (left.1 - left.0).max(0.0);
    let right_len = (right.1 - right.0).max(0.0);
    let total = left_len + right_len;

    if total <= 0.0 {
        log::warn!(
            "Episode: spawn exclusion band around x={:.1} covers the whole spawn range, ignoring it",
            target
        );
        return rng.random_range(low..=high);
    }

    let u = rng.random_range(0.0..total);
    if u < left_len {
        left.0 + u
    } else {
        right.0 + (u - left_len)
    }
}
