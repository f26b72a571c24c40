//! Slot identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slot positions reserved by the music manager.
pub const RESERVED_SLOTS: usize = 2;

/// Index of a slot inside the music manager.
///
/// Positions below [`RESERVED_SLOTS`] are owned by the manager itself
/// (intro and level music); positions after them are handed out by `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(usize);

impl SlotId {
    /// Reserved slot for intro/menu music.
    pub const INTRO: Self = Self(0);

    /// Reserved slot for level music driven by the playlist.
    pub const LEVEL: Self = Self(1);

    /// Creates a slot id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Checks if this id names one of the reserved slots.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 < RESERVED_SLOTS
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target of a manager-wide operation: one slot or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SlotTarget {
    /// Apply to every slot
    #[default]
    All,
    /// Apply to a single slot
    Slot(SlotId),
}

impl From<SlotId> for SlotTarget {
    fn from(id: SlotId) -> Self {
        Self::Slot(id)
    }
}
