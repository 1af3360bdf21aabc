//! Car-to-car overlap resolution.
//!
//! Every car is a circle of [`CAR_RADIUS`]. Each overlapping pair is pushed
//! apart symmetrically along the line joining them and both lose speed.
//! The check is all-pairs, which is fine for the handful of cars in a race.

use glam::Vec2;

use crate::vehicle::{StepSkip, Vehicle, VehicleId};

pub const CAR_RADIUS: f32 = 2.5;
/// Speed multiplier applied to both cars of a colliding pair.
pub const BUMP_PENALTY: f32 = 0.85;

/// A pair that was separated this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub a: VehicleId,
    pub b: VehicleId,
    /// Overlap that was resolved.
    pub depth: f32,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionPass {
    pub contacts: Vec<Contact>,
    /// Cars left out because their position was not finite.
    pub skipped: Vec<StepSkip>,
}

/// Separates one pair if they overlap.
///
/// Coincident cars have no joining line; they are split along +x.
pub fn resolve_pair(a: &mut Vehicle, b: &mut Vehicle) -> Option<f32> {
    let min_gap = CAR_RADIUS * 2.0;
    let delta = a.position - b.position;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_gap * min_gap {
        return None;
    }
    let dist = dist_sq.sqrt();
    let depth = min_gap - dist;
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::X
    };
    let shift = normal * depth * 0.5;
    a.position += shift;
    b.position -= shift;
    a.speed *= BUMP_PENALTY;
    b.speed *= BUMP_PENALTY;
    Some(depth)
}

/// Resolves every overlapping pair once, in list order.
pub fn resolve_all(vehicles: &mut [&mut Vehicle]) -> CollisionPass {
    let mut pass = CollisionPass::default();
    for v in vehicles.iter() {
        if !v.position.is_finite() {
            pass.skipped.push(StepSkip::NonFinitePosition(v.id.clone()));
        }
    }

    for i in 0..vehicles.len() {
        let (head, tail) = vehicles.split_at_mut(i + 1);
        let a = &mut *head[i];
        if !a.position.is_finite() {
            continue;
        }
        for b in tail.iter_mut() {
            if !b.position.is_finite() {
                continue;
            }
            if let Some(depth) = resolve_pair(a, b) {
                pass.contacts.push(Contact {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    depth,
                });
            }
        }
    }
    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarConfig;
    use crate::track::StartSlot;
    use crate::vehicle::Controller;

    fn car(id: VehicleId, x: f32, z: f32) -> Vehicle {
        Vehicle::new(
            id,
            "car",
            CarConfig::nomad(),
            StartSlot::new(x, z, 0.0),
            Controller::Human,
        )
    }

    #[test]
    fn test_overlap_separated_to_exact_gap() {
        let mut a = car(VehicleId::Player, 10.0, 4.0);
        let mut b = car(VehicleId::Ai(0), 13.0, 4.0);
        a.speed = 1.0;
        b.speed = -0.5;
        let midpoint = (a.position + b.position) * 0.5;

        let depth = resolve_pair(&mut a, &mut b).unwrap();
        assert!((depth - 2.0).abs() < 1e-6);
        assert!((a.position.distance(b.position) - 5.0).abs() < 1e-5);
        assert!(((a.position + b.position) * 0.5 - midpoint).length() < 1e-5);
        assert!((a.speed - 0.85).abs() < 1e-6);
        assert!((b.speed + 0.425).abs() < 1e-6);
    }

    #[test]
    fn test_zero_speed_pair() {
        let mut a = car(VehicleId::Player, 0.0, 0.0);
        let mut b = car(VehicleId::Ai(0), 0.0, 3.0);
        resolve_pair(&mut a, &mut b).unwrap();
        assert_eq!(a.position, Vec2::new(0.0, -1.0));
        assert_eq!(b.position, Vec2::new(0.0, 4.0));
        assert!(a.speed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_coincident_cars_split_along_x() {
        let mut a = car(VehicleId::Player, 5.0, 5.0);
        let mut b = car(VehicleId::Ai(0), 5.0, 5.0);
        resolve_pair(&mut a, &mut b).unwrap();
        assert_eq!(a.position, Vec2::new(7.5, 5.0));
        assert_eq!(b.position, Vec2::new(2.5, 5.0));
    }

    #[test]
    fn test_apart_cars_untouched() {
        let mut a = car(VehicleId::Player, 0.0, 0.0);
        let mut b = car(VehicleId::Ai(0), 0.0, 5.0);
        a.speed = 1.0;
        assert_eq!(resolve_pair(&mut a, &mut b), None);
        assert!((a.speed - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_all_pairs_skip_nan() {
        let mut a = car(VehicleId::Player, 0.0, 0.0);
        let mut b = car(VehicleId::Ai(0), 1.0, 0.0);
        let mut c = car(VehicleId::Ai(1), f32::NAN, 0.0);
        let mut d = car(VehicleId::Remote("peer".into()), 100.0, 0.0);
        let mut list = vec![&mut a, &mut b, &mut c, &mut d];

        let pass = resolve_all(&mut list);
        assert_eq!(pass.contacts.len(), 1);
        assert_eq!(pass.contacts[0].a, VehicleId::Player);
        assert_eq!(pass.skipped, vec![StepSkip::NonFinitePosition(VehicleId::Ai(1))]);
        assert!(d.position.x.is_finite());
        assert!(c.position.x.is_nan());
    }
}
