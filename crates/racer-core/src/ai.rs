//! Waypoint-pursuit driver for offline opponents.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use crate::config::Difficulty;
use crate::track::Waypoint;
use crate::vehicle::{Controller, StepSkip, Vehicle};

/// Distance at which the driver switches to the next waypoint.
pub const CAPTURE_RADIUS: f32 = 40.0;
/// Fraction of the heading error corrected per tick.
pub const STEER_GAIN: f32 = 0.1;
/// Heading error beyond which the driver reports a turn.
pub const TURN_THRESHOLD: f32 = 0.1;
/// Heading error below which the driver treats the road as straight.
pub const STRAIGHT_THRESHOLD: f32 = 0.15;

const LANE_SPREAD: f32 = 16.0;

/// Per-opponent steering state, fixed personality plus pursuit progress.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDriver {
    pub difficulty: Difficulty,
    /// Index into the track's waypoint list.
    pub waypoint: usize,
    /// Applied to the car's top speed and acceleration.
    pub scale: f32,
    /// Lateral bias used on straight segments.
    pub lane_offset: f32,
    pub last_turn_dir: i8,
}

impl AiDriver {
    /// Rolls a random personality for the given difficulty.
    pub fn new(difficulty: Difficulty, rng: &mut impl Rng) -> Self {
        let variation = 0.95 + rng.random::<f32>() * 0.1;
        let lane_offset = (rng.random::<f32>() - 0.5) * LANE_SPREAD;
        Self::with_personality(difficulty, variation, lane_offset)
    }

    pub fn with_personality(difficulty: Difficulty, variation: f32, lane_offset: f32) -> Self {
        Self {
            difficulty,
            waypoint: 0,
            scale: difficulty.speed_multiplier() * variation,
            lane_offset,
            last_turn_dir: 0,
        }
    }

    /// Target point for the current waypoint with the lane bias applied.
    ///
    /// Only waypoints lying exactly on an axis get the bias.
    #[allow(clippy::float_cmp)]
    fn target(&self, waypoint: Waypoint) -> Vec2 {
        let mut target = Vec2::new(waypoint.x, waypoint.z);
        if waypoint.z == 0.0 {
            target.x += self.lane_offset;
        }
        if waypoint.x == 0.0 {
            target.y += self.lane_offset;
        }
        target
    }
}

/// What one steering pass decided.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteerReport {
    /// Signed heading error before correction.
    pub angle_diff: f32,
    pub emitted_particles: bool,
}

/// Wraps an angle into (-π, π].
pub fn normalize_angle(angle: f32) -> f32 {
    PI - (PI - angle).rem_euclid(TAU)
}

/// Turns an AI car toward its waypoint and sets its throttle.
///
/// Runs before [`crate::kinematics::step`], which then replays
/// `last_turn_dir` and applies the usual clamp and friction. Non-AI
/// vehicles are left untouched.
pub fn steer(
    vehicle: &mut Vehicle,
    waypoints: &[Waypoint],
    can_drive: bool,
    rng: &mut impl Rng,
) -> Result<SteerReport, StepSkip> {
    let finished = vehicle.finished();
    let Vehicle {
        id,
        controller,
        position,
        heading,
        speed,
        config,
        effects,
        ..
    } = vehicle;
    let Controller::Ai(driver) = controller else {
        return Ok(SteerReport::default());
    };
    if !can_drive || finished {
        return Ok(SteerReport::default());
    }
    if waypoints.is_empty() {
        return Err(StepSkip::MissingWaypoints(id.clone()));
    }
    if !position.is_finite() {
        return Err(StepSkip::NonFinitePosition(id.clone()));
    }

    driver.waypoint %= waypoints.len();
    let delta = driver.target(waypoints[driver.waypoint]) - *position;
    if delta.length() < CAPTURE_RADIUS {
        driver.waypoint = (driver.waypoint + 1) % waypoints.len();
    }

    let desired = delta.x.atan2(delta.y);
    let angle_diff = normalize_angle(desired - *heading);
    *heading += angle_diff * STEER_GAIN;
    driver.last_turn_dir = if angle_diff > TURN_THRESHOLD {
        1
    } else if angle_diff < -TURN_THRESHOLD {
        -1
    } else {
        0
    };

    let mut report = SteerReport {
        angle_diff,
        emitted_particles: false,
    };
    let mut max_speed = config.max_speed * driver.scale;
    let mut accel = config.accel * driver.scale;

    if angle_diff.abs() < STRAIGHT_THRESHOLD {
        match driver.difficulty {
            Difficulty::Hard => {
                max_speed *= 1.45;
                accel *= 1.5;
                if *speed > config.max_speed * 0.8 {
                    effects.emit_exhaust(*position, *heading, rng);
                    report.emitted_particles = true;
                }
            }
            Difficulty::Medium => max_speed *= 1.15,
            Difficulty::Easy => {}
        }
    } else {
        // Brake into corners.
        max_speed *= 0.85;
    }

    *speed = (*speed + accel).min(max_speed);
    Ok(report)
}
