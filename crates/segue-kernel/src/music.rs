//! Music System
//!
//! Re-exports the music building blocks for convenience.
//!
//! # Modules
//!
//! - [`music_decoder`](crate::music_decoder): PCM decoders and providers
//! - [`music_graph`](crate::music_graph): Presets, segments and transition edges
//! - [`music_handoff`](crate::music_handoff): Lock-free parameter and transition cells
//! - [`music_player`](crate::music_player): Pull-based simple and dynamic players
//! - [`music_output`](crate::music_output): Output trait, volumes and the offline device
//! - [`music_backend`](crate::music_backend): Rodio sound card output
//!
//! # Quick Start
//!
//! ```ignore
//! use segue_kernel::music::*;
//!
//! let output = RodioOutput::new()?;
//! let decoder = FileDecoderProvider::new().open(&MusicSource::new("Music/01.ogg"))?;
//! let handle = output.play_music(decoder, MusicParameters::default());
//!
//! // Once per game tick
//! output.update();
//!
//! handle.ask_stop();
//! ```
//!
//! # Dynamic Music
//!
//! ```ignore
//! let mut graph = PresetGraph::new();
//! let calm = graph.add_track(provider.open(&"calm.ogg".into())?);
//! let fight = graph.add_track(provider.open(&"fight.ogg".into())?);
//!
//! let explore = graph.add_preset();
//! let combat = graph.add_preset();
//! graph.add_segment_to_preset(explore, calm)?;
//! graph.add_segment_to_preset(combat, fight)?;
//! graph.set_next_segment(explore, 0, explore, 0)?;
//! graph.set_next_segment(explore, 0, combat, 0)?;
//! graph.set_next_segment(combat, 0, combat, 0)?;
//!
//! let (preset, segment) = graph.starting_segment();
//! let handle = output.play_dynamic_music(graph.presets(), preset, segment, MusicParameters::default())?;
//! handle.request_preset_transition(combat)?;
//! ```

pub use crate::music_backend::{PlayerSource, RodioOutput, DEFAULT_BUFFER_FRAMES};
pub use crate::music_decoder::{
    DecoderProvider, FileDecoderProvider, MemoryDecoder, MemoryDecoderProvider, RodioDecoder,
    SharedDecoder, StreamDecoder,
};
pub use crate::music_graph::{Preset, PresetGraph, Segment};
pub use crate::music_handoff::{MusicParameters, ParameterCell, ParameterReader, TransitionCell};
pub use crate::music_output::{
    AudioCategory, MusicOutput, OfflineOutput, OutputGain, RenderedBlock, VolumeSettings,
};
pub use crate::music_player::{
    MusicPlayer, PlayerHandle, PlayerState, MAX_SOURCE_SWITCHES_PER_PULL, MUSIC_PRIORITY,
};

pub use segue_common::{AudioFormat, MusicSource, SampleEncoding};
