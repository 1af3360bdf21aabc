//! Boost pads.

use crate::track::BoostPad;
use crate::vehicle::Vehicle;

pub const PICKUP_RADIUS: f32 = 10.0;
/// Boost frames granted by a pad.
pub const BOOST_FRAMES: u32 = 120;
/// A car only refills once its remaining boost drops below this.
pub const REFILL_BELOW: u32 = 110;

/// Refills the boost timer of a car sitting on any pad.
///
/// Finished cars and mirrors are ignored. Returns `true` on a pickup.
pub fn collect_boost(vehicle: &mut Vehicle, pads: &[BoostPad]) -> bool {
    if vehicle.finished() || vehicle.is_mirror() || !vehicle.position.is_finite() {
        return false;
    }
    let mut picked = false;
    for pad in pads {
        if vehicle.position.distance(pad.position()) < PICKUP_RADIUS
            && vehicle.boost_timer < REFILL_BELOW
        {
            vehicle.boost_timer = BOOST_FRAMES;
            picked = true;
        }
    }
    picked
}
