//! # Segue Kernel
//!
//! Real-time side of the music engine.
//!
//! This crate provides:
//! - Decoders producing raw PCM from music sources
//! - Dynamic music graphs (track pool, presets, segments, edges)
//! - Simple and dynamic music players with a pull-based data callback
//! - Lock-free hand-off of parameters and preset requests to the audio context
//! - Output devices: rodio on the sound card, or offline rendering
//!
//! ## Contexts
//!
//! Two contexts touch a player. The control context (game loop) builds
//! graphs, starts players and publishes parameters through a
//! [`PlayerHandle`]. The audio context (the device) owns the
//! [`MusicPlayer`] and pulls PCM from it. The only state they share is a
//! handful of atomics, so the audio context never waits on the game loop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod music;
pub mod music_backend;
pub mod music_decoder;
pub mod music_graph;
pub mod music_handoff;
pub mod music_output;
pub mod music_player;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::music_backend::*;
    pub use crate::music_decoder::*;
    pub use crate::music_graph::*;
    pub use crate::music_handoff::*;
    pub use crate::music_output::*;
    pub use crate::music_player::*;
}

pub use prelude::*;
