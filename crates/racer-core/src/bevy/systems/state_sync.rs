//! State synchronization systems.
//!
//! Syncs the latest tick to the `RaceStateStore` for UI access.

use bevy::prelude::*;

use crate::bevy::{LatestTick, RaceStateStore};

/// Copies the latest tick into the shared store whenever it changes.
pub fn sync_race_to_store(latest: Res<LatestTick>, store: Res<RaceStateStore>) {
    if !latest.is_changed() {
        return;
    }
    match &latest.0 {
        Some(output) => store.update(output.clone()),
        None => store.clear(),
    }
}
