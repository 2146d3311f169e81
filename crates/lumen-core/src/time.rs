//! Time sources for the Lumen engine
//!
//! Two clocks matter to the lighting loop: the wall clock, which drives the
//! day/night cycle, and the monotonic frame time (a `Duration` since startup),
//! which drives tweens and the idle timer.

use std::time::Duration;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Local wall-clock time at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    /// Hour of day (0 - 23)
    pub hour: u32,
    /// Minute of hour (0 - 59)
    pub minute: u32,
}

impl ClockTime {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Hours since midnight as a fraction, `hour + minute / 60`
    pub fn fractional_hours(&self) -> f32 {
        self.hour as f32 + self.minute as f32 / 60.0
    }

    /// Get formatted time string (HH:MM)
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

/// Source of local wall-clock time
pub trait WallClock {
    fn now(&self) -> ClockTime;
}

/// Reads the host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> ClockTime {
        let now = chrono::Local::now();
        ClockTime::new(now.hour(), now.minute())
    }
}

/// A clock frozen at a fixed time, for previews and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockTime);

impl FixedClock {
    pub fn at(hour: u32, minute: u32) -> Self {
        Self(ClockTime::new(hour, minute))
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> ClockTime {
        self.0
    }
}

/// Identifies one scheduling of a [`DeferredTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    generation: u64,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A single-shot, cancellable deferred callback driven by frame time.
///
/// At most one scheduling is pending at a time: `restart` cancels any pending
/// instance before scheduling the next one, and a fired timer stays quiet
/// until it is restarted.
#[derive(Debug, Clone)]
pub struct DeferredTimer {
    delay: Duration,
    deadline: Option<Duration>,
    generation: u64,
}

impl DeferredTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending instance and schedule a new one `delay` after `now`
    pub fn restart(&mut self, now: Duration) -> TimerHandle {
        self.cancel();
        self.generation += 1;
        self.deadline = Some(now + self.delay);
        TimerHandle {
            generation: self.generation,
        }
    }

    /// Cancel the pending instance. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time at which the pending instance will fire
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Fire the pending instance if its deadline has passed.
    ///
    /// Returns the handle of the instance that fired, at most once per `restart`.
    pub fn poll(&mut self, now: Duration) -> Option<TimerHandle> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(TimerHandle {
                    generation: self.generation,
                })
            }
            _ => None,
        }
    }
}
