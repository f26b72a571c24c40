//! Fixed-rate tick timing.
//!
//! The music manager runs once per game tick. [`TickTimer`] turns wall
//! time into a whole number of ticks and sleeps until the next one is due.

use std::time::{Duration, Instant};

/// Most ticks run for a single wake-up before the backlog is dropped.
const MAX_CATCH_UP_TICKS: u32 = 10;

/// Longest wall-clock step accepted from one wake-up.
const MAX_DELTA: Duration = Duration::from_millis(250);

/// Fixed timestep tick scheduler.
#[derive(Debug)]
pub struct TickTimer {
    /// Ticks per second
    tick_rate: u32,
    /// Length of one tick
    tick_duration: Duration,
    /// Time of the last wake-up
    last_wake: Instant,
    /// Time owed to ticks not yet run
    accumulator: Duration,
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(60)
    }
}

impl TickTimer {
    /// Create a timer running at `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            tick_duration: Duration::from_secs_f64(1.0 / f64::from(tick_rate)),
            last_wake: Instant::now(),
            accumulator: Duration::ZERO,
        }
    }

    /// Ticks per second.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Number of ticks covering `seconds`.
    #[must_use]
    pub fn ticks_for(&self, seconds: u64) -> u64 {
        seconds.saturating_mul(u64::from(self.tick_rate))
    }

    /// Time elapsed since the previous call, clamped to [`MAX_DELTA`].
    pub fn delta_time(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last_wake;
        self.last_wake = now;
        dt.min(MAX_DELTA)
    }

    /// Adds `dt` to the backlog and returns how many ticks should run now.
    pub fn accumulate(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.tick_duration && count < MAX_CATCH_UP_TICKS {
            self.accumulator -= self.tick_duration;
            count += 1;
        }

        // Still behind: drop the backlog instead of bursting later
        if self.accumulator > self.tick_duration * 2 {
            self.accumulator = Duration::ZERO;
        }

        count
    }

    /// Sleeps until the next tick is due.
    pub fn sleep_remainder(&self) {
        let owed = self.tick_duration.saturating_sub(self.accumulator);
        let spent = self.last_wake.elapsed();
        if let Some(remaining) = owed.checked_sub(spent) {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration() {
        let timer = TickTimer::new(50);
        assert_eq!(timer.tick_duration, Duration::from_millis(20));
        assert_eq!(timer.tick_rate(), 50);
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        assert_eq!(TickTimer::new(0).tick_rate(), 1);
    }

    #[test]
    fn test_accumulate_whole_ticks() {
        let mut timer = TickTimer::new(100);
        assert_eq!(timer.accumulate(Duration::from_millis(5)), 0);
        assert_eq!(timer.accumulate(Duration::from_millis(5)), 1);
        assert_eq!(timer.accumulate(Duration::from_millis(25)), 2);
    }

    #[test]
    fn test_accumulate_caps_catch_up() {
        let mut timer = TickTimer::new(1000);
        assert_eq!(timer.accumulate(Duration::from_millis(100)), MAX_CATCH_UP_TICKS);
        // Backlog was dropped
        assert_eq!(timer.accumulate(Duration::ZERO), 0);
    }

    #[test]
    fn test_ticks_for() {
        let timer = TickTimer::new(60);
        assert_eq!(timer.ticks_for(0), 0);
        assert_eq!(timer.ticks_for(3), 180);
    }
}
