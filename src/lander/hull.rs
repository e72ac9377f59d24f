//! Fixed hull geometry in body-local coordinates (+y points down)

use glam::Vec2;

/// Radius of every hull and fuel-span capsule
pub const SEGMENT_RADIUS: f32 = 2.0;

/// Rigid hull segments: top plate, right wall, right leg, left leg, left wall
pub const HULL_SEGMENTS: [(Vec2, Vec2); 5] = [
    (Vec2::new(-20.0, -15.0), Vec2::new(19.0, -15.0)),
    (Vec2::new(19.0, -15.0), Vec2::new(19.0, 13.0)),
    (Vec2::new(19.0, 13.0), Vec2::new(24.0, 24.0)),
    (Vec2::new(-20.0, 13.0), Vec2::new(-24.0, 24.0)),
    (Vec2::new(-20.0, 13.0), Vec2::new(-20.0, -15.0)),
];

/// Internal segment whose mass is the remaining fuel. Its endpoints double as
/// the twin engine mounts.
pub const FUEL_SPAN: (Vec2, Vec2) = (Vec2::new(-20.0, 13.0), Vec2::new(19.0, 13.0));

/// Body-local centre of the fuel span
pub fn fuel_span_center() -> Vec2 {
    (FUEL_SPAN.0 + FUEL_SPAN.1) / 2.0
}
