//! Per-tick vehicle integration.
//!
//! One call to [`step`] advances a locally simulated car by one frame:
//! pickup boost, nitrous, throttle and steering, speed clamp and friction,
//! position integration, render hints and skid detection, in that order.
//! Mirrors never go through here.

use rand::Rng;

use crate::input::ControlInput;
use crate::vehicle::{Controller, NITROUS_MAX, Vehicle};

/// Speed multiplier applied every driving tick.
pub const FRICTION: f32 = 0.95;
/// Speed multiplier applied every tick once a car has finished.
pub const COAST_DECAY: f32 = 0.98;
/// Speed multiplier while the brake is held.
pub const BRAKE_FACTOR: f32 = 0.8;

pub const BOOST_PAD_ACCEL: f32 = 0.08;
pub const BOOST_PAD_MAX_SCALE: f32 = 1.6;

pub const NITROUS_BURN: f32 = 0.6;
pub const NITROUS_REGEN: f32 = 0.15;
pub const NITROUS_ACCEL: f32 = 0.06;
pub const NITROUS_MAX_SCALE: f32 = 1.5;
/// Minimum |speed| before nitrous can fire.
pub const NITROUS_MIN_SPEED: f32 = 0.5;
/// Tank level above which a released lockout clears.
pub const NITROUS_LOCKOUT_RELEASE: f32 = 15.0;

/// Below this |speed| steering has no effect.
const STEER_MIN_SPEED: f32 = 0.1;

/// Side effects of one kinematics step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// Effective top speed this tick after boost multipliers.
    pub max_speed: f32,
    pub emitted_particles: bool,
    pub stamped_skid: bool,
}

/// Advances a locally simulated vehicle by one tick.
///
/// `input` is only read for the human car. AI cars replay the turn
/// direction their driver computed in the steering pass.
pub fn step(
    vehicle: &mut Vehicle,
    input: Option<&ControlInput>,
    can_drive: bool,
    rng: &mut impl Rng,
) -> StepReport {
    let input = input.copied().unwrap_or_default();
    let human = matches!(vehicle.controller, Controller::Human);
    let finished = vehicle.finished();
    let driving = can_drive && !finished;

    let mut report = StepReport::default();
    vehicle.turn_dir = 0;
    vehicle.boosting = false;
    vehicle.skidding = false;
    let mut max_speed = vehicle.config.max_speed;

    if vehicle.boost_timer > 0 {
        vehicle.boost_timer -= 1;
        vehicle.speed += BOOST_PAD_ACCEL;
        max_speed *= BOOST_PAD_MAX_SCALE;
    }

    if driving && human {
        let tank = &mut vehicle.nitrous;
        if !input.nitrous && tank.level > NITROUS_LOCKOUT_RELEASE {
            tank.lockout = false;
        }

        if input.nitrous
            && !tank.lockout
            && tank.level > 0.0
            && vehicle.speed.abs() > NITROUS_MIN_SPEED
        {
            vehicle.boosting = true;
            tank.level -= NITROUS_BURN;
            if tank.level <= 0.0 {
                tank.level = 0.0;
                tank.lockout = true;
            }
            max_speed *= NITROUS_MAX_SCALE;
            vehicle.speed += NITROUS_ACCEL;
            vehicle
                .effects
                .emit_exhaust(vehicle.position, vehicle.heading, rng);
            report.emitted_particles = true;
        } else {
            tank.level = (tank.level + NITROUS_REGEN).min(NITROUS_MAX);
        }
    }

    if driving {
        if let Controller::Ai(driver) = &vehicle.controller {
            vehicle.turn_dir = driver.last_turn_dir;
        } else if human {
            apply_controls(vehicle, &input);
        }
    }

    vehicle.speed = vehicle.speed.max(-max_speed / 2.0).min(max_speed);
    if driving {
        vehicle.speed *= FRICTION;
    } else if finished {
        vehicle.speed *= COAST_DECAY;
    }

    vehicle.position += vehicle.forward() * vehicle.speed;
    vehicle
        .visual
        .apply(vehicle.turn_dir, vehicle.speed, max_speed, finished);

    if driving {
        vehicle.skidding = skid_detected(vehicle, &input, human);
    }
    if vehicle.skidding {
        report.stamped_skid = vehicle
            .effects
            .stamp_skid(vehicle.position, vehicle.heading);
    }
    vehicle.effects.update();

    report.max_speed = max_speed;
    report
}

fn apply_controls(vehicle: &mut Vehicle, input: &ControlInput) {
    if input.forward {
        vehicle.speed += vehicle.config.accel;
    }
    if input.back {
        vehicle.speed -= vehicle.config.accel;
    }
    if input.brake {
        vehicle.speed *= BRAKE_FACTOR;
    }

    if vehicle.speed.abs() > STEER_MIN_SPEED {
        // Steering inverts when reversing.
        let sign = vehicle.speed.signum();
        let handling = vehicle.config.handling;
        if input.left {
            vehicle.heading += handling * sign;
            vehicle.turn_dir = 1;
        } else if input.right {
            vehicle.heading -= handling * sign;
            vehicle.turn_dir = -1;
        } else {
            vehicle.turn_dir = 0;
        }
    }
}

fn skid_detected(vehicle: &Vehicle, input: &ControlInput, human: bool) -> bool {
    let speed = vehicle.speed.abs();
    let max_speed = vehicle.config.max_speed;
    if human {
        let threshold = if vehicle.boosting { 0.4 } else { 0.6 };
        (input.turning() && speed > max_speed * threshold) || (input.brake && speed > 0.2)
    } else {
        vehicle.turn_dir != 0 && speed > max_speed * 0.7
    }
}
