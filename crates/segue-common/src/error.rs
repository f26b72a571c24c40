//! Error types for the Segue music engine.
//!
//! Nothing here is fatal to the process: every failure degrades to
//! "music does nothing this tick". Segment format changes and source
//! exhaustion are not errors at all; the player reports them as short reads.

use thiserror::Error;

use crate::ids::SlotId;

/// Top-level error type for music operations.
#[derive(Debug, Error)]
pub enum MusicError {
    /// Invalid index or wrong slot kind passed to a control call
    #[error("Configuration error: {0}")]
    Configuration(#[from] GraphError),

    /// A source, decoder, or output device is unavailable
    #[error("Resource unavailable: {0}")]
    Resource(#[from] ResourceError),
}

impl MusicError {
    /// Returns true for errors caused by invalid graph or slot configuration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for errors caused by a missing source or device.
    #[must_use]
    pub const fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }
}

/// Errors raised while building or querying a segment/preset graph.
///
/// These are always reported before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Preset index out of range
    #[error("Invalid preset index {0}")]
    InvalidPreset(usize),

    /// Segment index out of range for its preset
    #[error("Invalid segment {segment} in preset {preset}")]
    InvalidSegment {
        /// Preset the segment was looked up in
        preset: usize,
        /// Offending segment index
        segment: usize,
    },

    /// Track index out of range for the slot's track pool
    #[error("Invalid track index {0}")]
    InvalidTrack(usize),

    /// Slot index does not name a user-loaded slot
    #[error("Invalid slot {0}")]
    InvalidSlot(SlotId),

    /// Operation requires a different slot variant
    #[error("Slot {slot} is not a {expected} slot")]
    WrongSlotKind {
        /// Slot the operation was applied to
        slot: SlotId,
        /// Variant the operation needs
        expected: &'static str,
    },

    /// Dynamic graph has no playable starting segment
    #[error("Preset graph has no segments")]
    EmptyGraph,

    /// Slot has no active player to forward the request to
    #[error("Slot is not playing")]
    NotPlaying,
}

/// Errors raised when an external collaborator cannot provide a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Source could not be opened by the decoder
    #[error("Failed to open music source '{source_name}': {message}")]
    SourceUnavailable {
        /// Display name of the source
        source_name: String,
        /// Decoder message
        message: String,
    },

    /// Slot has no source opened
    #[error("No music source opened")]
    NoSource,

    /// Source opened but its data is not in a decodable format
    #[error("Failed to decode music source: {0}")]
    DecodeFailed(String),

    /// No output device available
    #[error("No audio output device available")]
    NoOutput,

    /// Output device failed to initialize
    #[error("Failed to initialize audio output: {0}")]
    OutputInitFailed(String),
}

/// Result type alias for music operations.
pub type MusicResult<T> = Result<T, MusicError>;
