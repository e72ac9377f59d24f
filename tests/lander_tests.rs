//! Integration tests for lander flight, termination and scoring
//!
//! These tests fly real landers through the physics backend over generated
//! or hand-built terrain.

use std::sync::{Arc, Mutex};

use genetic_lander::episode::{EpisodeController, Spawn};
use genetic_lander::lander::{
    DeathCause, FlightContext, Lander, LanderConfig, LanderStatus, ProximityFitness, RollMode,
    SensorSuite,
};
use genetic_lander::neural::{ConstantController, Controller};
use genetic_lander::physics::PhysicsWorld;
use genetic_lander::terrain::{
    find_flattest_span, LandingZone, NoiseGenerator, TerrainConfig, TerrainProfile,
};
use genetic_lander::SimulationConfig;
use glam::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rapier2d::prelude::{nalgebra, vector, Rotation};

fn flat_terrain(y: f32) -> TerrainProfile {
    let points = (0..=10).map(|i| Vec2::new(i as f32 * 128.0, y)).collect();
    TerrainProfile::from_points(points, 1280.0, 720.0).unwrap()
}

fn idle(config: &LanderConfig) -> Box<dyn Controller> {
    let (inputs, outputs) = config.controller_shape();
    Box::new(ConstantController::idle(inputs, outputs))
}

fn full(config: &LanderConfig) -> Box<dyn Controller> {
    let (inputs, outputs) = config.controller_shape();
    Box::new(ConstantController::full(inputs, outputs))
}

/// Idle controller that keeps every input vector it is given
struct RecordingController {
    inputs: usize,
    outputs: usize,
    sent: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl RecordingController {
    fn new(config: &LanderConfig) -> (Self, Arc<Mutex<Vec<Vec<f32>>>>) {
        let (inputs, outputs) = config.controller_shape();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let controller = Self {
            inputs,
            outputs,
            sent: Arc::clone(&sent),
        };
        (controller, sent)
    }
}

impl Controller for RecordingController {
    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
    }

    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        self.sent.lock().unwrap().push(inputs.to_vec());
        vec![-1.0; self.outputs]
    }
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-2, "input {}: {} != {}", i, a, e);
    }
}

/// Step physics, dispatch first contacts and update the lander, like an
/// episode does
fn tick(lander: &mut Lander, physics: &mut PhysicsWorld, ctx: &FlightContext) {
    for event in physics.step() {
        if event.lander == lander.body() {
            lander.on_collision(physics, ctx);
        }
    }
    lander.update(physics, ctx);
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn test_idle_lander_falls_and_collides() {
    let mut config = SimulationConfig::default();
    config.terrain = TerrainConfig {
        break_count: 50,
        exaggeration: 300.0,
        ..Default::default()
    };

    // First seeded terrain whose surface under the spawn point is well below it
    let terrain = (0..100)
        .map(|seed| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let noise = NoiseGenerator::new(&mut rng);
            TerrainProfile::generate(&noise, &config.terrain, 1280.0, 720.0).unwrap()
        })
        .find(|terrain| terrain.height_at(640.0).is_some_and(|y| y > 200.0))
        .expect("a seeded terrain with room to fall");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let zone = find_flattest_span(&terrain, config.terrain.flat_span_width, &mut rng);
    assert!((0.0..=1280.0).contains(&zone.x));

    let fitness = ProximityFitness::new(config.fitness.clone());
    let controller = EpisodeController::new(&config, &fitness);
    let mut physics = PhysicsWorld::new(&config.physics);

    let spawns = vec![Spawn {
        genome: 0,
        controller: idle(&config.lander),
        position: Vec2::new(640.0, 100.0),
    }];
    let summary = controller.fly(&mut physics, &terrain, zone, spawns).unwrap();

    assert!(!summary.timed_out);
    assert!(summary.ticks < 2000);
    assert!(summary.results[0].has_collided);
    assert_eq!(physics.body_count(), 0);
}

#[test]
fn test_baseline_episode_terminates() {
    let mut config = SimulationConfig::default();
    config.episode.max_ticks = 5000;
    let fitness = ProximityFitness::new(config.fitness.clone());
    let controller = EpisodeController::new(&config, &fitness);
    let mut physics = PhysicsWorld::new(&config.physics);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);

    let population = (0..10).map(|id| (id, idle(&config.lander))).collect();
    let summary = controller.run(&mut physics, population, &mut rng).unwrap();

    assert!(!summary.timed_out);
    assert_eq!(summary.results.len(), 10);
    for result in &summary.results {
        assert!(result.has_collided || matches!(result.status, LanderStatus::Destroyed(_)));
        assert_eq!(result.fuel, config.lander.max_fuel);
    }
    assert_eq!(
        summary.landed + summary.crashed + summary.roll_killed + summary.out_of_bounds,
        10
    );
}

#[test]
fn test_tick_limit_stops_hovering_landers() {
    let mut config = SimulationConfig::default();
    config.episode.max_ticks = 3;
    let fitness = ProximityFitness::new(config.fitness.clone());
    let controller = EpisodeController::new(&config, &fitness);
    let mut physics = PhysicsWorld::new(&config.physics);

    let spawns = vec![Spawn {
        genome: 7,
        controller: idle(&config.lander),
        position: Vec2::new(300.0, 100.0),
    }];
    let terrain = flat_terrain(600.0);
    let zone = LandingZone { x: 900.0, y: 600.0 };
    let summary = controller.fly(&mut physics, &terrain, zone, spawns).unwrap();

    assert!(summary.timed_out);
    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.results[0].status, LanderStatus::Flying);
    assert_eq!(physics.body_count(), 0);
}

// ============================================================================
// Controller Inputs
// ============================================================================

#[test]
fn test_standard_inputs_reach_the_controller_in_order() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 900.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let (controller, sent) = RecordingController::new(&config);
    let mut physics = PhysicsWorld::default();
    terrain.spawn_colliders(&mut physics, 0.9);
    let mut lander = Lander::spawn(
        0,
        Box::new(controller),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    lander.update(&mut physics, &ctx);

    // altitude, x/y deviation to the zone, velocity, angular velocity, fuel
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_close(&sent[0], &[300.0, 260.0, 300.0, 0.0, 0.0, 0.0, 845.0]);
    assert_eq!(SensorSuite::Standard.inputs(lander.readings()), sent[0]);
}

#[test]
fn test_extended_inputs_include_terrain_scans() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 900.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig {
        sensors: SensorSuite::Extended,
        ..Default::default()
    };
    let (controller, sent) = RecordingController::new(&config);
    let mut physics = PhysicsWorld::default();
    terrain.spawn_colliders(&mut physics, 0.9);
    let mut lander = Lander::spawn(
        0,
        Box::new(controller),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    // Scans only see colliders the query pipeline has picked up in a step
    for _ in 0..3 {
        tick(&mut lander, &mut physics, &ctx);
    }

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    let last = sent.last().unwrap();
    assert_eq!(last.len(), 12);

    let position = lander.position();
    let velocity = lander.velocity();
    let altitude = 600.0 - position.y;
    assert!(velocity.y > 0.0);
    assert_close(
        last,
        &[
            altitude,
            altitude,
            altitude,
            900.0 - position.x,
            600.0 - position.y,
            1280.0 - position.x,
            position.x,
            position.y,
            velocity.x,
            velocity.y,
            last[10],
            845.0,
        ],
    );
    assert!(last[10].abs() < 1e-3);

    let readings = lander.readings();
    assert_eq!(&SensorSuite::Extended.inputs(readings), last);
    assert!(readings.left_scan.is_finite() && readings.right_scan.is_finite());
}

// ============================================================================
// Fuel
// ============================================================================

#[test]
fn test_empty_tank_never_thrusts() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig {
        max_fuel: 0.0,
        ..Default::default()
    };
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        full(&config),
        Vec2::new(640.0, 100.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    let mut ticks = 0;
    while lander.alive() && !lander.has_collided() && ticks < 500 {
        tick(&mut lander, &mut physics, &ctx);
        assert!(lander.throttle().is_off());
        assert_eq!(lander.applied_thrust(), Vec2::ZERO);
        assert_eq!(lander.fuel(), 0.0);
        ticks += 1;
    }

    // Nothing slowed it down
    assert!(lander.has_collided());
    assert_eq!(lander.status(), LanderStatus::Destroyed(DeathCause::Speed));
    assert_eq!(lander.death(), Some(DeathCause::Speed));
    assert!(lander.velocity().y > config.max_land_vel_y);
}

#[test]
fn test_fuel_is_monotonic_and_mirrored_in_mass() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig {
        max_fuel: 40.0,
        ..Default::default()
    };
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        full(&config),
        Vec2::new(640.0, 400.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    let mut previous = lander.fuel();
    let mut ticks = 0;
    while lander.alive() && !lander.has_collided() && ticks < 500 {
        tick(&mut lander, &mut physics, &ctx);
        assert!(lander.fuel() <= previous);
        assert!(lander.fuel() >= 0.0);
        if lander.alive() {
            let mass = lander.fuel_span_mass(&physics).unwrap();
            assert!((mass - lander.fuel()).abs() < 1e-2);
        }
        previous = lander.fuel();
        ticks += 1;
    }

    assert_eq!(previous, 0.0);
}

// ============================================================================
// Collisions and Roll
// ============================================================================

#[test]
fn test_collision_handler_is_idempotent() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        idle(&config),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    assert!(!lander.has_collided());
    lander.on_collision(&mut physics, &ctx);
    assert!(lander.has_collided());
    assert_eq!(lander.status(), LanderStatus::Landed);
    let fitness_after_first = lander.fitness();

    lander.on_collision(&mut physics, &ctx);
    assert!(lander.has_collided());
    assert_eq!(lander.status(), LanderStatus::Landed);
    assert_eq!(lander.fitness(), fitness_after_first);
    assert!(physics.contains_body(lander.body()));
}

#[test]
fn test_landed_lander_stays_inert() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        full(&config),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    lander.on_collision(&mut physics, &ctx);
    let fuel = lander.fuel();
    for _ in 0..5 {
        tick(&mut lander, &mut physics, &ctx);
        assert!(lander.throttle().is_off());
        assert_eq!(lander.applied_thrust(), Vec2::ZERO);
        assert_eq!(lander.fuel(), fuel);
    }
}

#[test]
fn test_landed_lander_tipping_over_is_killed_by_roll() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        idle(&config),
        Vec2::new(640.0, 560.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    lander.on_collision(&mut physics, &ctx);
    lander.update(&mut physics, &ctx);
    assert_eq!(lander.status(), LanderStatus::Landed);
    assert!(lander.fitness() > 0.0);

    physics
        .body_mut(lander.body())
        .unwrap()
        .set_rotation(Rotation::new(2.0), true);
    lander.update(&mut physics, &ctx);

    assert_eq!(lander.status(), LanderStatus::Destroyed(DeathCause::Roll));
    assert!(lander.has_collided());
    assert!(lander.killed_by_roll());
    assert!(!physics.contains_body(lander.body()));
    assert!(lander.fitness() < -ProximityFitness::default().config.roll_kill_penalty);
}

#[test]
fn test_landed_lander_leaving_the_screen_is_destroyed() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        idle(&config),
        Vec2::new(640.0, 560.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    lander.on_collision(&mut physics, &ctx);
    assert_eq!(lander.status(), LanderStatus::Landed);

    physics
        .body_mut(lander.body())
        .unwrap()
        .set_translation(vector![-200.0, 560.0], true);
    lander.update(&mut physics, &ctx);

    assert_eq!(
        lander.status(),
        LanderStatus::Destroyed(DeathCause::OutOfBounds)
    );
    assert!(!lander.killed_by_roll());
    assert!(!physics.contains_body(lander.body()));
}

#[test]
fn test_tilted_lander_is_killed_by_roll() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig::default();
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        idle(&config),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();
    physics
        .body_mut(lander.body())
        .unwrap()
        .set_rotation(Rotation::new(120f32.to_radians()), true);

    lander.update(&mut physics, &ctx);

    assert!(lander.killed_by_roll());
    assert_eq!(lander.status(), LanderStatus::Destroyed(DeathCause::Roll));
    assert!(!physics.contains_body(lander.body()));
}

#[test]
fn test_roll_killed_landers_rank_below_every_normal_outcome() {
    let fitness = ProximityFitness::default();
    let terrain = flat_terrain(600.0);
    let zone = LandingZone { x: 640.0, y: 600.0 };
    let positions = [
        Vec2::new(640.0, 560.0),
        Vec2::new(600.0, 100.0),
        Vec2::new(60.0, 100.0),
        Vec2::new(1220.0, 100.0),
        Vec2::new(-20.0, 100.0),
    ];

    let outcomes = |config: &SimulationConfig| {
        let controller = EpisodeController::new(config, &fitness);
        let mut physics = PhysicsWorld::new(&config.physics);
        let spawns = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Spawn {
                genome: i as u64,
                controller: idle(&config.lander),
                position,
            })
            .collect();
        controller.fly(&mut physics, &terrain, zone, spawns).unwrap()
    };

    let normal = outcomes(&SimulationConfig::default());

    let mut rolling = SimulationConfig::default();
    rolling.lander.roll_threshold = -1.0;
    let rolled = outcomes(&rolling);

    assert_eq!(rolled.roll_killed, positions.len());
    assert_eq!(normal.roll_killed, 0);

    let best_rolled = rolled
        .results
        .iter()
        .map(|r| r.evaluation.fitness)
        .fold(f32::NEG_INFINITY, f32::max);
    let worst_normal = normal
        .results
        .iter()
        .map(|r| r.evaluation.fitness)
        .fold(f32::INFINITY, f32::min);
    assert!(best_rolled < worst_normal);
}

#[test]
fn test_penalize_mode_never_kills_for_roll() {
    let terrain = flat_terrain(600.0);
    let fitness = ProximityFitness::default();
    let ctx = FlightContext {
        terrain: &terrain,
        landing_zone: LandingZone { x: 640.0, y: 600.0 },
        fitness: &fitness,
    };
    let config = LanderConfig {
        roll_mode: RollMode::Penalize,
        roll_threshold: -1.0,
        ..Default::default()
    };
    let mut physics = PhysicsWorld::default();
    let mut lander = Lander::spawn(
        0,
        idle(&config),
        Vec2::new(640.0, 300.0),
        &config,
        &mut physics,
        &ctx,
    )
    .unwrap();

    tick(&mut lander, &mut physics, &ctx);
    tick(&mut lander, &mut physics, &ctx);

    assert!(lander.alive());
    assert!(!lander.killed_by_roll());
    assert_eq!(lander.roll_penalty(), 2.0 * config.roll_penalty);
}
