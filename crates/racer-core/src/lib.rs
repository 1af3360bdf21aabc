//! Racer Core Library
//!
//! Deterministic arcade racing simulation: car kinematics, AI drivers,
//! checkpoint and lap tracking, soft track containment, collisions,
//! pickups, and mirroring of remote players in online races.
//!
//! [`session::RaceSession`] owns one race and advances it a tick at a
//! time. The `bevy` module drives a session from a Bevy app.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod ai;
pub mod audio;
pub mod clock;
pub mod collision;
pub mod config;
pub mod containment;
pub mod effects;
pub mod hud;
pub mod input;
pub mod kinematics;
pub mod pickups;
pub mod progress;
pub mod session;
pub mod sync;
pub mod track;
pub mod vehicle;

// Bevy integration
pub mod bevy;

pub use ai::AiDriver;
pub use audio::{AudioCue, AudioSink, SilentAudio};
pub use config::{CarConfig, Difficulty, RaceConfig};
pub use hud::{CameraHint, HudState, RaceEvent, ResultRow, TickOutput, VehicleFrame};
pub use input::{ControlInput, InputSource, KeyBindings};
pub use session::{OnlineRoom, RaceMode, RacePhase, RaceSession};
pub use sync::{NetworkInbox, Outbox, RosterEntry, Transport};
pub use track::{Track, TrackError, TrackLayout};
pub use vehicle::{Controller, StepSkip, Vehicle, VehicleId};
