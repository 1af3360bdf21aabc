//! Systems for the race integration.
//!
//! Organized by functionality:
//! - command: Command queue processing from the host
//! - race: Fixed-rate ticking and the pause key
//! - state_sync: Sync the latest tick to the shared store for UI

pub mod command;
pub mod race;
pub mod state_sync;

pub use command::*;
pub use race::*;
pub use state_sync::*;
