//! Time-based scalar tweens

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curve applied to normalized tween progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Slow start, fast finish
    CubicIn,
    /// Fast start, slow finish
    CubicOut,
}

impl Easing {
    /// Map progress in [0, 1] onto the curve. Input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }
}

/// Animates a scalar from `from` to `to` over `duration`, starting at `start`.
///
/// The value is a pure function of the sample time, so sampling twice at the
/// same instant gives the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn start_value(&self) -> f32 {
        self.from
    }

    pub fn end_value(&self) -> f32 {
        self.to
    }

    /// Normalized progress at `now`, clamped to [0, 1]
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Interpolated value at `now`
    pub fn sample(&self, now: Duration) -> f32 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }
}
