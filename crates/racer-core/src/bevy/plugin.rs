//! Bevy plugin for the race simulation.
//!
//! `RaceSimPlugin` is logic only: no window, renderer or audio backend.
//! Hosts add their own presentation on top and read `LatestTick`,
//! the published messages or the `RaceStateStore`.

use bevy::prelude::*;

use crate::bevy::events::*;
use crate::bevy::resources::*;
use crate::bevy::systems;
use crate::config::RaceConfig;
use crate::input::KeyBindings;

/// Headless race plugin.
///
/// Use this plugin in tests with `MinimalPlugins` to run the race
/// without requiring a windowing or rendering backend.
#[derive(Default)]
pub struct RaceSimPlugin {
    pub config: RaceConfig,
    pub bindings: KeyBindings,
    pub command_queue: Option<RaceCommandQueue>,
    pub state_store: Option<RaceStateStore>,
}

impl Plugin for RaceSimPlugin {
    fn build(&self, app: &mut App) {
        // ====================================================================
        // Fixed timestep at the race tick rate
        // ====================================================================
        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_rate()));

        // ====================================================================
        // Resources
        // ====================================================================
        app.insert_resource(RaceSettings {
            config: self.config.clone(),
            bindings: self.bindings.clone(),
        })
        .insert_resource(ActiveRace::default())
        .insert_resource(LatestTick::default())
        .insert_resource(self.command_queue.clone().unwrap_or_default())
        .insert_resource(self.state_store.clone().unwrap_or_default());

        // ====================================================================
        // Messages
        // ====================================================================
        app.add_message::<RaceEventMessage>()
            .add_message::<AudioCueMessage>();

        // ====================================================================
        // Systems
        // ====================================================================
        app.add_systems(
            Update,
            (
                systems::process_commands,
                systems::handle_pause_key,
                systems::sync_race_to_store,
            )
                .chain(),
        );
        app.add_systems(FixedUpdate, systems::advance_race);
    }
}
