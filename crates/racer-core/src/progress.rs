//! Checkpoint and lap counting, finish detection and standings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::track::Checkpoint;
use crate::vehicle::{StepSkip, Vehicle};

/// A transition of one vehicle's race progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Passed a checkpoint; `next` is the one to visit now.
    Checkpoint { next: usize },
    /// Crossed the line without finishing.
    Lap { laps: u32 },
    /// Completed the final lap.
    Finished { laps: u32, time: f32 },
}

/// Rounds a race time to hundredths, the precision results are shown at.
pub fn round_time(seconds: f32) -> f32 {
    (seconds * 100.0).round() / 100.0
}

/// Advances a vehicle's checkpoint/lap state if it is inside its target gate.
///
/// Finished vehicles never transition again. `elapsed` is seconds since the
/// green light and becomes the finish time when the last lap completes.
pub fn check_progress(
    vehicle: &mut Vehicle,
    checkpoints: &[Checkpoint],
    max_laps: u32,
    elapsed: f32,
) -> Result<Option<ProgressEvent>, StepSkip> {
    if vehicle.finished() {
        return Ok(None);
    }
    if !vehicle.position.is_finite() {
        return Err(StepSkip::NonFinitePosition(vehicle.id.clone()));
    }
    let index = vehicle.progress.checkpoint;
    let Some(gate) = checkpoints.get(index) else {
        return Err(StepSkip::MissingCheckpoint {
            vehicle: vehicle.id.clone(),
            index,
        });
    };
    if !gate.contains(vehicle.position) {
        return Ok(None);
    }

    let next = index + 1;
    if next < checkpoints.len() {
        vehicle.progress.checkpoint = next;
        return Ok(Some(ProgressEvent::Checkpoint { next }));
    }

    vehicle.progress.checkpoint = 0;
    vehicle.progress.laps += 1;
    let laps = vehicle.progress.laps;
    if laps >= max_laps {
        let time = round_time(elapsed.max(0.0));
        vehicle.finish(time);
        Ok(Some(ProgressEvent::Finished { laps, time }))
    } else {
        Ok(Some(ProgressEvent::Lap { laps }))
    }
}

fn score(vehicle: &Vehicle) -> u64 {
    u64::from(vehicle.progress.laps) * 100 + vehicle.progress.checkpoint as u64 * 10
}

/// Squared distance from a vehicle to its own target checkpoint.
fn gap_to_target(vehicle: &Vehicle, checkpoints: &[Checkpoint]) -> Option<f32> {
    if checkpoints.is_empty() {
        return None;
    }
    let target = checkpoints[vehicle.progress.checkpoint % checkpoints.len()];
    Some(vehicle.position.distance_squared(target.center()))
}

/// Race order between two vehicles, leader first.
///
/// Finished cars rank ahead of everyone still racing, by finish time.
/// Unfinished cars rank by laps and checkpoints, then by how close each is
/// to its own next checkpoint.
pub fn compare(a: &Vehicle, b: &Vehicle, checkpoints: &[Checkpoint]) -> Ordering {
    match (a.progress.finish_time, b.progress.finish_time) {
        (Some(ta), Some(tb)) => return ta.total_cmp(&tb),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => {}
    }

    score(b).cmp(&score(a)).then_with(|| {
        match (gap_to_target(a, checkpoints), gap_to_target(b, checkpoints)) {
            (Some(da), Some(db)) => da.partial_cmp(&db).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        }
    })
}

/// Sorts vehicles into race order.
pub fn standings<'a, I>(vehicles: I, checkpoints: &[Checkpoint]) -> Vec<&'a Vehicle>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    let mut order: Vec<&Vehicle> = vehicles.into_iter().collect();
    order.sort_by(|a, b| compare(a, b, checkpoints));
    order
}

/// Ordinal suffix for a 1-based rank.
pub fn ordinal_suffix(rank: usize) -> &'static str {
    match rank {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
