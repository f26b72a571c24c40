//! Cross-context hand-off cells.
//!
//! Both cells are single atomic words, so the control context can publish
//! and the audio context can read without either side ever waiting.
//!
//! ```text
//! ParameterCell word (AtomicU64):
//! ┌──────────────────────┬──────┬────────────────────────┐
//! │ version (31 bits)    │ loop │ volume (f32 bits)      │
//! └──────────────────────┴──────┴────────────────────────┘
//!  63                  33   32   31                     0
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Volume and loop flag for one music stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicParameters {
    /// Per-track volume in [0, 1]
    pub volume: f32,
    /// Rewind at end of source instead of stopping
    pub looping: bool,
}

impl Default for MusicParameters {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: true,
        }
    }
}

impl MusicParameters {
    /// Creates parameters, clamping volume to [0, 1].
    #[must_use]
    pub fn new(looping: bool, volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            looping,
        }
    }
}

const VOLUME_MASK: u64 = 0xFFFF_FFFF;
const LOOP_BIT: u64 = 1 << 32;
const VERSION_SHIFT: u32 = 33;

fn pack(version: u32, parameters: MusicParameters) -> u64 {
    (u64::from(version) << VERSION_SHIFT)
        | if parameters.looping { LOOP_BIT } else { 0 }
        | u64::from(parameters.volume.to_bits())
}

fn unpack(bits: u64) -> (u32, MusicParameters) {
    let version = (bits >> VERSION_SHIFT) as u32;
    let parameters = MusicParameters {
        volume: f32::from_bits((bits & VOLUME_MASK) as u32),
        looping: bits & LOOP_BIT != 0,
    };
    (version, parameters)
}

/// Latest-value cell for [`MusicParameters`].
///
/// Every store bumps a version so readers can tell whether anything
/// changed since they last looked. Intermediate stores may be skipped;
/// a reader always sees a complete value.
#[derive(Debug)]
pub struct ParameterCell {
    bits: AtomicU64,
}

impl ParameterCell {
    /// Creates a cell holding `parameters` at version 0.
    #[must_use]
    pub fn new(parameters: MusicParameters) -> Self {
        Self {
            bits: AtomicU64::new(pack(0, parameters)),
        }
    }

    /// Publishes new parameters.
    pub fn store(&self, parameters: MusicParameters) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let (version, _) = unpack(current);
            let next = pack(version.wrapping_add(1) & (u32::MAX >> 1), parameters);
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Reads the most recently published parameters.
    #[must_use]
    pub fn load(&self) -> MusicParameters {
        unpack(self.bits.load(Ordering::Acquire)).1
    }

    /// Version of the most recent store.
    #[must_use]
    pub fn version(&self) -> u32 {
        unpack(self.bits.load(Ordering::Acquire)).0
    }

    fn load_versioned(&self) -> (u32, MusicParameters) {
        unpack(self.bits.load(Ordering::Acquire))
    }
}

impl Default for ParameterCell {
    fn default() -> Self {
        Self::new(MusicParameters::default())
    }
}

/// Reader-side cursor that reports each published version once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterReader {
    seen: u32,
}

impl ParameterReader {
    /// Creates a reader that has seen the cell's current version.
    #[must_use]
    pub fn new(cell: &ParameterCell) -> Self {
        Self {
            seen: cell.version(),
        }
    }

    /// Returns the latest parameters if they were published after the last poll.
    pub fn poll(&mut self, cell: &ParameterCell) -> Option<MusicParameters> {
        let (version, parameters) = cell.load_versioned();
        if version == self.seen {
            return None;
        }
        self.seen = version;
        Some(parameters)
    }
}

const NO_REQUEST: usize = usize::MAX;

/// Single-slot, last-write-wins preset transition request.
///
/// Requests made between two segment boundaries collapse to the most
/// recent one. The audio context settles a request only when it honors
/// it, so a newer request that races the boundary is kept for the next.
#[derive(Debug)]
pub struct TransitionCell {
    requested: AtomicUsize,
}

impl TransitionCell {
    /// Creates an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requested: AtomicUsize::new(NO_REQUEST),
        }
    }

    /// Records a request, replacing any pending one.
    pub fn request(&self, preset: usize) {
        self.requested.store(preset, Ordering::Release);
    }

    /// Returns the pending request without consuming it.
    #[must_use]
    pub fn pending(&self) -> Option<usize> {
        match self.requested.load(Ordering::Acquire) {
            NO_REQUEST => None,
            preset => Some(preset),
        }
    }

    /// Clears the request if it is still `preset`.
    pub fn settle(&self, preset: usize) -> bool {
        self.requested
            .compare_exchange(preset, NO_REQUEST, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for TransitionCell {
    fn default() -> Self {
        Self::new()
    }
}
