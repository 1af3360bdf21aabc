//! ECS messages published by the race systems.
//!
//! Note: In Bevy 0.18+, buffered events use Message trait instead of Event.

use bevy::prelude::*;

use crate::audio::AudioCue;
use crate::hud::RaceEvent;

/// A race event from the latest tick (countdown, lap, finish, results).
#[derive(Message, Debug, Clone, PartialEq)]
pub struct RaceEventMessage(pub RaceEvent);

/// A sound cue for whatever audio backend the host runs.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct AudioCueMessage(pub AudioCue);
