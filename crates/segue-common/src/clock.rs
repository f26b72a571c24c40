//! Audio clock used to time fades and seed shuffling.
//!
//! Ticks are monotonic and owned by the control context. Arithmetic on
//! them always wraps, so a clock may run for the lifetime of the process.

use std::sync::atomic::{AtomicU32, Ordering};

/// Source of the current audio tick.
pub trait AudioClock {
    /// Returns the current tick.
    fn current_tick(&self) -> u32;
}

/// Clock advanced explicitly by the game loop.
#[derive(Debug, Default)]
pub struct ManualClock {
    tick: AtomicU32,
}

impl ManualClock {
    /// Creates a clock starting at the given tick.
    #[must_use]
    pub const fn starting_at(tick: u32) -> Self {
        Self {
            tick: AtomicU32::new(tick),
        }
    }

    /// Advances the clock by one tick and returns the new value.
    pub fn advance(&self) -> u32 {
        self.advance_by(1)
    }

    /// Advances the clock by `ticks` and returns the new value.
    pub fn advance_by(&self, ticks: u32) -> u32 {
        self.tick.fetch_add(ticks, Ordering::Relaxed).wrapping_add(ticks)
    }

    /// Sets the clock to an absolute tick.
    pub fn set(&self, tick: u32) {
        self.tick.store(tick, Ordering::Relaxed);
    }
}

impl AudioClock for ManualClock {
    fn current_tick(&self) -> u32 {
        self.tick.load(Ordering::Relaxed)
    }
}
