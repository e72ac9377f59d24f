//! Integration tests for terrain generation and landing zone search

use genetic_lander::physics::PhysicsWorld;
use genetic_lander::terrain::{find_flattest_span, NoiseGenerator, TerrainConfig, TerrainProfile};
use glam::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

fn generate(seed: u64, config: &TerrainConfig) -> TerrainProfile {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let noise = NoiseGenerator::new(&mut rng);
    TerrainProfile::generate(&noise, config, WIDTH, HEIGHT).expect("terrain should generate")
}

// ============================================================================
// Profile Properties
// ============================================================================

#[test]
fn test_generated_profiles_are_well_formed() {
    let configs = [
        TerrainConfig::default(),
        TerrainConfig {
            exaggeration: 300.0,
            ..Default::default()
        },
        TerrainConfig {
            break_count: 2,
            ..Default::default()
        },
        TerrainConfig {
            break_count: 200,
            exaggeration: 1000.0,
            ..Default::default()
        },
    ];

    for config in &configs {
        for seed in 0..25 {
            let terrain = generate(seed, config);
            let points = terrain.points();

            assert_eq!(points.len(), config.break_count);
            assert_eq!(points[0].x, 0.0);
            assert_eq!(points[points.len() - 1].x, WIDTH);
            assert!(points.windows(2).all(|pair| pair[1].x > pair[0].x));
            assert!(points.iter().all(|p| (0.0..=HEIGHT).contains(&p.y)));
        }
    }
}

#[test]
fn test_same_seed_same_terrain() {
    let config = TerrainConfig::default();
    assert_eq!(generate(42, &config), generate(42, &config));
    assert_ne!(generate(42, &config), generate(43, &config));
}

#[test]
fn test_ground_polygon_is_closed_at_the_bottom() {
    let terrain = generate(3, &TerrainConfig::default());
    let polygon = terrain.polygon();

    assert_eq!(polygon.first(), Some(&Vec2::new(0.0, HEIGHT)));
    assert_eq!(polygon.last(), Some(&Vec2::new(WIDTH, HEIGHT)));
    assert_eq!(terrain.segments().count(), terrain.points().len() - 1);
}

#[test]
fn test_ground_colliders_are_released_with_the_body() {
    let config = TerrainConfig::default();
    let terrain = generate(4, &config);
    let mut physics = PhysicsWorld::default();

    let body = terrain.spawn_colliders(&mut physics, config.friction);
    assert!(physics.collider_count() > 0);
    assert!(physics.collider_count() <= terrain.segments().count());

    assert!(physics.remove_body(body));
    assert!(!physics.remove_body(body));
    assert_eq!(physics.collider_count(), 0);
}

// ============================================================================
// Landing Zone
// ============================================================================

#[test]
fn test_landing_zone_lies_on_the_terrain() {
    let config = TerrainConfig {
        exaggeration: 300.0,
        ..Default::default()
    };

    for seed in 0..25 {
        let terrain = generate(seed, &config);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let zone = find_flattest_span(&terrain, config.flat_span_width, &mut rng);

        assert!((0.0..=WIDTH).contains(&zone.x));
        let surface = terrain.height_at(zone.x).expect("zone inside terrain");
        assert!((zone.y - surface).abs() < 1e-3);
    }
}

#[test]
fn test_flat_terrain_landing_zone_height() {
    let points = (0..=20).map(|i| Vec2::new(i as f32 * 64.0, 480.0)).collect();
    let terrain = TerrainProfile::from_points(points, WIDTH, HEIGHT).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);

    for width in [1.0, 64.0, 100.0, 640.0, WIDTH] {
        let zone = find_flattest_span(&terrain, width, &mut rng);
        assert_eq!(zone.y, 480.0);
        assert!((0.0..=WIDTH).contains(&zone.x));
    }
}

#[test]
fn test_flattest_span_prefers_lowest_start() {
    // Two equally flat plateaus; the left one wins
    let heights = [500.0, 500.0, 500.0, 300.0, 450.0, 450.0, 450.0];
    let points = heights
        .iter()
        .enumerate()
        .map(|(i, &y)| Vec2::new(i as f32 * 100.0, y))
        .collect();
    let terrain = TerrainProfile::from_points(points, 600.0, HEIGHT).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);

    let zone = find_flattest_span(&terrain, 200.0, &mut rng);
    assert_eq!(zone.x, 100.0);
    assert_eq!(zone.y, 500.0);
}
