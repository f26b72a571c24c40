//! Tick-driven volume fades.
//!
//! A fade is a linear ramp from the volume a slot had when the fade was
//! armed to a limit volume, over a whole number of audio ticks. Ticks wrap,
//! so elapsed time is always computed with wrapping arithmetic.

/// Which way a fade moves the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Volume increases toward the limit.
    Up,
    /// Volume decreases toward the limit (or stays).
    Down,
}

/// Result of advancing a fade to the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeStep {
    /// Volume clamped so it never passes the limit.
    pub volume: f32,
    /// The limit has been reached and the fade is over.
    pub finished: bool,
    /// The slot should pause now that it is silent.
    pub pause: bool,
}

/// An armed volume ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    start_tick: u32,
    duration: u32,
    start_volume: f32,
    limit_volume: f32,
    stop_on_zero: bool,
}

impl Fade {
    /// Arms a fade at `start_tick` from `start_volume` to `limit_volume`.
    #[must_use]
    pub fn new(start_tick: u32, duration: u32, start_volume: f32, limit_volume: f32, stop_on_zero: bool) -> Self {
        Self {
            start_tick,
            duration,
            start_volume,
            limit_volume: limit_volume.clamp(0.0, 1.0),
            stop_on_zero,
        }
    }

    /// Tick the fade was armed at.
    #[must_use]
    pub const fn start_tick(&self) -> u32 {
        self.start_tick
    }

    /// Length of the ramp in ticks.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Volume the fade ends at.
    #[must_use]
    pub const fn limit_volume(&self) -> f32 {
        self.limit_volume
    }

    /// Whether the slot pauses once a fade to silence completes.
    #[must_use]
    pub const fn stop_on_zero(&self) -> bool {
        self.stop_on_zero
    }

    /// Direction of the ramp.
    #[must_use]
    pub fn direction(&self) -> FadeDirection {
        if self.limit_volume > self.start_volume {
            FadeDirection::Up
        } else {
            FadeDirection::Down
        }
    }

    /// Linearly interpolated volume at tick `now`.
    #[must_use]
    pub fn compute(&self, now: u32) -> (FadeDirection, f32) {
        let elapsed = now.wrapping_sub(self.start_tick);
        let volume = if elapsed >= self.duration {
            self.limit_volume
        } else {
            let progress = elapsed as f32 / self.duration as f32;
            self.start_volume + (self.limit_volume - self.start_volume) * progress
        };
        (self.direction(), volume)
    }

    /// Volume to apply at tick `now`, clamped toward the limit.
    #[must_use]
    pub fn step(&self, now: u32) -> FadeStep {
        let (direction, volume) = self.compute(now);
        let volume = match direction {
            FadeDirection::Up => volume.min(self.limit_volume),
            FadeDirection::Down => volume.max(self.limit_volume),
        };

        let finished = volume == self.limit_volume;
        FadeStep {
            volume,
            finished,
            pause: finished && self.stop_on_zero && volume <= 0.0,
        }
    }
}
