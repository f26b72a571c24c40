//! Game phase as seen by the music manager.

use serde::{Deserialize, Serialize};

/// Coarse state of the game, polled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Title screen and menus.
    #[default]
    Menu,
    /// Level is loading.
    Loading,
    /// A level is being played.
    InProgress,
    /// Level finished (won, lost, or quit).
    Over,
}

impl GamePhase {
    /// Check if level music should be running.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}
