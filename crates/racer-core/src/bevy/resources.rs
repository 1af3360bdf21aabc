//! ECS resources for the race integration.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::{Mutex, RwLock};

use crate::config::{Difficulty, RaceConfig};
use crate::hud::TickOutput;
use crate::input::KeyBindings;
use crate::session::{OnlineRoom, RaceSession};
use crate::sync::{NetworkInbox, Transport};
use crate::track::Track;

/// The running race, if any.
#[derive(Resource, Default)]
pub struct ActiveRace(pub Option<RaceSession>);

impl ActiveRace {
    pub fn session(&self) -> Option<&RaceSession> {
        self.0.as_ref()
    }
}

/// Tuning and bindings used for the next session.
#[derive(Resource, Debug, Clone, Default)]
pub struct RaceSettings {
    pub config: RaceConfig,
    pub bindings: KeyBindings,
}

/// Output of the most recent tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct LatestTick(pub Option<TickOutput>);

// ============================================================================
// Commands
// ============================================================================

/// Commands from the host (menu, lobby, socket owner).
pub enum RaceCommand {
    StartOffline {
        track: Track,
        car_index: usize,
        difficulty: Difficulty,
    },
    StartOnline {
        track: Track,
        car_index: usize,
        room: OnlineRoom,
        inbox: NetworkInbox,
        transport: Box<dyn Transport>,
    },
    TogglePause,
    Restart,
    Stop,
    SetBindings(KeyBindings),
}

impl std::fmt::Debug for RaceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartOffline { track, .. } => write!(f, "StartOffline({})", track.name),
            Self::StartOnline { room, .. } => write!(f, "StartOnline({})", room.room_id),
            Self::TogglePause => f.write_str("TogglePause"),
            Self::Restart => f.write_str("Restart"),
            Self::Stop => f.write_str("Stop"),
            Self::SetBindings(_) => f.write_str("SetBindings"),
        }
    }
}

/// Thread-safe command queue shared with the host.
#[derive(Resource, Clone, Default)]
pub struct RaceCommandQueue {
    inner: Arc<Mutex<VecDeque<RaceCommand>>>,
}

impl RaceCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a command to be processed.
    pub fn push(&self, command: RaceCommand) {
        self.inner.lock().push_back(command);
    }

    /// Drain all pending commands.
    pub fn drain(&self) -> Vec<RaceCommand> {
        self.inner.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

// ============================================================================
// Shared store
// ============================================================================

#[derive(Debug, Default)]
struct StoreInner {
    latest: Option<TickOutput>,
    version: u64,
}

/// Latest tick output for a UI layer polling from outside the ECS.
///
/// The version bumps on every update so pollers can skip unchanged frames.
#[derive(Resource, Debug, Clone, Default)]
pub struct RaceStateStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl RaceStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_latest(&self) -> Option<TickOutput> {
        self.inner.read().latest.clone()
    }

    pub fn get_version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn update(&self, output: TickOutput) {
        let mut inner = self.inner.write();
        inner.latest = Some(output);
        inner.version += 1;
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.latest = None;
        inner.version += 1;
    }
}
