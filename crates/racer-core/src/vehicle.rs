//! The vehicle record shared by the player, AI opponents and remote mirrors.

use std::fmt;

use glam::Vec2;
use racer_proto::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ai::AiDriver;
use crate::config::CarConfig;
use crate::effects::EffectPools;
use crate::sync::RemoteMirror;
use crate::track::StartSlot;

/// Full tank.
pub const NITROUS_MAX: f32 = 100.0;

/// Stable handle for a vehicle within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VehicleId {
    Player,
    Ai(usize),
    Remote(ConnectionId),
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleId::Player => write!(f, "player"),
            VehicleId::Ai(index) => write!(f, "ai#{index}"),
            VehicleId::Remote(id) => write!(f, "remote:{id}"),
        }
    }
}

/// Who decides how a vehicle moves.
#[derive(Debug, Clone)]
pub enum Controller {
    /// Keyboard input, simulated locally.
    Human,
    /// Waypoint pursuit, simulated locally.
    Ai(AiDriver),
    /// Never simulated; replays the last received snapshot.
    Remote(RemoteMirror),
}

/// Nitrous tank with its depletion lockout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nitrous {
    pub level: f32,
    /// Set when the tank runs dry; blocks boosting until it recovers.
    pub lockout: bool,
}

impl Default for Nitrous {
    fn default() -> Self {
        Self {
            level: NITROUS_MAX,
            lockout: false,
        }
    }
}

/// Lap and checkpoint counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceProgress {
    pub laps: u32,
    /// Index of the next checkpoint to visit.
    pub checkpoint: usize,
    /// Seconds since the green light, set once on finishing.
    pub finish_time: Option<f32>,
}

impl RaceProgress {
    pub fn finished(&self) -> bool {
        self.finish_time.is_some()
    }
}

/// Render hints derived each tick. Not physics state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualState {
    /// Chassis roll in radians.
    pub chassis_roll: f32,
    /// Accumulated wheel rotation in radians.
    pub wheel_spin: f32,
    /// Front wheel yaw in radians.
    pub front_steer: f32,
}

impl VisualState {
    /// Recomputes the hints from the current motion.
    pub fn apply(&mut self, turn_dir: i8, speed: f32, max_speed: f32, finished: bool) {
        let turn = f32::from(turn_dir);
        self.chassis_roll = if max_speed > 0.0 {
            turn * (speed / max_speed) * 0.1
        } else {
            0.0
        };
        self.wheel_spin -= speed * 0.5;
        self.front_steer = if finished { 0.0 } else { turn * 0.5 };
    }
}

/// One car in the race.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub config: CarConfig,
    /// Ground-plane position, `x` lateral and `y` holding world `z`.
    pub position: Vec2,
    /// Radians, 0 faces +z.
    pub heading: f32,
    pub speed: f32,
    pub nitrous: Nitrous,
    /// Frames of pickup boost remaining.
    pub boost_timer: u32,
    pub progress: RaceProgress,
    /// Last applied turn direction, -1, 0 or 1.
    pub turn_dir: i8,
    pub boosting: bool,
    pub skidding: bool,
    pub visual: VisualState,
    pub effects: EffectPools,
    pub controller: Controller,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        name: impl Into<String>,
        config: CarConfig,
        slot: StartSlot,
        controller: Controller,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            position: slot.position(),
            heading: slot.angle,
            speed: 0.0,
            nitrous: Nitrous::default(),
            boost_timer: 0,
            progress: RaceProgress::default(),
            turn_dir: 0,
            boosting: false,
            skidding: false,
            visual: VisualState::default(),
            effects: EffectPools::default(),
            controller,
        }
    }

    /// Unit vector the car drives along at positive speed.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }

    pub fn finished(&self) -> bool {
        self.progress.finished()
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.heading.is_finite() && self.speed.is_finite()
    }

    pub fn is_mirror(&self) -> bool {
        matches!(self.controller, Controller::Remote(_))
    }

    pub fn is_ai(&self) -> bool {
        matches!(self.controller, Controller::Ai(_))
    }

    /// Marks the car finished. Later calls keep the first time.
    pub fn finish(&mut self, time: f32) -> bool {
        if self.finished() {
            return false;
        }
        self.progress.finish_time = Some(time);
        true
    }
}

/// Problems that make a vehicle sit out one tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepSkip {
    #[error("{0} has a non-finite position")]
    NonFinitePosition(VehicleId),
    #[error("{vehicle} targets missing checkpoint {index}")]
    MissingCheckpoint { vehicle: VehicleId, index: usize },
    #[error("{0} has no waypoints to follow")]
    MissingWaypoints(VehicleId),
    #[error("no mirror registered for connection {0}")]
    UnknownMirror(ConnectionId),
}
