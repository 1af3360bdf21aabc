//! Bevy integration for the race session.
//!
//! The session itself is plain Rust; this module drives it from a
//! `FixedUpdate` schedule at the race tick rate, feeds it keyboard input
//! and republishes every tick as Bevy messages and a shared store a UI
//! layer can poll.

pub mod events;
pub mod input;
pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use events::*;
pub use input::{JustPressed, key_code};
pub use plugin::RaceSimPlugin;
pub use resources::*;
