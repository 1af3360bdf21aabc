//! Test utilities for headless Bevy integration tests.
//!
//! Provides `TestApp`, a wrapper around `bevy::app::App` that uses
//! `MinimalPlugins` + `RaceSimPlugin` for testing the race integration
//! without a rendering or windowing backend.

use bevy::prelude::*;

use crate::bevy::plugin::RaceSimPlugin;
use crate::bevy::resources::{LatestTick, RaceCommand, RaceCommandQueue};
use crate::hud::TickOutput;

/// A headless Bevy app wrapper for testing.
pub(crate) struct TestApp {
    pub app: App,
}

impl TestApp {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::input::InputPlugin);
        app.add_plugins(RaceSimPlugin::default());
        // Pause virtual time so that only explicit steps advance the race.
        app.world_mut().resource_mut::<Time<Virtual>>().pause();
        app.update();
        Self { app }
    }

    /// Run a single frame update.
    pub fn update(&mut self) {
        self.app.update();
    }

    /// Advance the race by exactly `n` fixed timesteps.
    ///
    /// Feeds time straight into the fixed-timestep accumulator; with
    /// virtual time paused each update runs `FixedUpdate` once.
    pub fn step(&mut self, n: usize) {
        let dt = self.app.world().resource::<Time<Fixed>>().timestep();
        for _ in 0..n {
            self.app
                .world_mut()
                .resource_mut::<Time<Fixed>>()
                .accumulate_overstep(dt);
            self.app.update();
        }
    }

    /// Push a command to the command queue.
    pub fn push_command(&mut self, cmd: RaceCommand) {
        self.app.world().resource::<RaceCommandQueue>().push(cmd);
    }

    pub fn latest(&self) -> Option<TickOutput> {
        self.app.world().resource::<LatestTick>().0.clone()
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
