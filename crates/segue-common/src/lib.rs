//! # Segue Common
//!
//! Common types shared by the Segue music engine crates.
//!
//! This crate provides the vocabulary both execution contexts agree on:
//! - Error taxonomy (configuration vs. resource failures)
//! - Slot identifiers and slot targeting
//! - PCM format descriptions
//! - Music source references
//! - The audio clock that drives tick-based fades

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clock;
pub mod error;
pub mod format;
pub mod ids;
pub mod source;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::error::*;
    pub use crate::format::*;
    pub use crate::ids::*;
    pub use crate::source::*;
}

pub use prelude::*;
