//! Soft track limits for the oval.
//!
//! The oval's centerline is two rails at x = ±80 between z = -100 and
//! z = 100, closed by radius-80 arcs around (0, ±100). A car that drifts
//! too far from it is nudged back and slowed down. Nothing stops a car
//! that keeps getting pushed out.

use glam::Vec2;

use crate::track::TrackLayout;
use crate::vehicle::{StepSkip, Vehicle};

pub const RAIL_X: f32 = 80.0;
pub const STRAIGHT_HALF_LENGTH: f32 = 100.0;
pub const CURVE_RADIUS: f32 = 80.0;
/// Allowed distance from the centerline.
pub const MAX_DEVIATION: f32 = 18.0;
/// Distance a wandering car is moved back per tick.
pub const NUDGE_STEP: f32 = 0.5;
/// Speed multiplier applied while off track.
pub const OFF_TRACK_PENALTY: f32 = 0.8;

/// Distance from the centerline and the direction back toward it.
///
/// Returns `None` at the exact center of a curve, where the direction is
/// undefined.
pub fn deviation(position: Vec2) -> Option<(f32, Vec2)> {
    let (x, z) = (position.x, position.y);
    if z > -STRAIGHT_HALF_LENGTH && z < STRAIGHT_HALF_LENGTH {
        let rail = if x < 0.0 { -RAIL_X } else { RAIL_X };
        let push = if x > rail { -1.0 } else { 1.0 };
        return Some(((x - rail).abs(), Vec2::new(push, 0.0)));
    }

    let center = Vec2::new(
        0.0,
        if z <= -STRAIGHT_HALF_LENGTH {
            -STRAIGHT_HALF_LENGTH
        } else {
            STRAIGHT_HALF_LENGTH
        },
    );
    let offset = center - position;
    let d = offset.length();
    if d <= f32::EPSILON {
        return None;
    }
    let mut push = offset / d;
    if d < CURVE_RADIUS {
        push = -push;
    }
    Some(((d - CURVE_RADIUS).abs(), push))
}

/// Pulls a car back toward the centerline if it strayed too far.
///
/// Returns `Ok(true)` when the car was nudged. Layouts without a known
/// centerline are left alone.
pub fn contain(vehicle: &mut Vehicle, layout: TrackLayout) -> Result<bool, StepSkip> {
    if !layout.has_containment() {
        return Ok(false);
    }
    if !vehicle.position.is_finite() {
        return Err(StepSkip::NonFinitePosition(vehicle.id.clone()));
    }
    let Some((distance, push)) = deviation(vehicle.position) else {
        return Ok(false);
    };
    if distance <= MAX_DEVIATION {
        return Ok(false);
    }
    vehicle.position += push * NUDGE_STEP;
    vehicle.speed *= OFF_TRACK_PENALTY;
    Ok(true)
}
