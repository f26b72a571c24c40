//! # Segue Gameplay
//!
//! Game-thread control of the Segue music engine.
//!
//! This crate provides:
//! - Music slots (standard and dynamic) with play/pause/close/fade
//! - Tick-driven linear fades
//! - The level music playlist (sequential or shuffled)
//! - Classic numbered level music lookup
//! - The music manager that owns every slot and runs once per game tick
//!
//! Nothing here touches audio data; slots talk to players only through
//! their handles, so no call in this crate waits on the audio context.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod classic;
pub mod fade;
pub mod game_phase;
pub mod manager;
pub mod playlist;
pub mod slot;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classic::*;
    pub use crate::fade::*;
    pub use crate::game_phase::*;
    pub use crate::manager::*;
    pub use crate::playlist::*;
    pub use crate::slot::*;
}

pub use prelude::*;
