//! Time utilities for the frame loop

use std::time::{Duration, Instant};

/// Interval between events at `per_second` events per second
pub fn interval_for_rate(per_second: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(per_second.max(1)))
}

/// Measures the time between consecutive frames
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_frame: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta time in seconds since the previous frame (0 on the first frame)
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        dt
    }
}

/// Fires once per `interval` of wall-clock time, independent of how often it
/// is polled.
///
/// Deadlines advance by whole intervals so polling jitter does not lower the
/// rate. After a stall longer than one interval it fires once and restarts
/// from `now` instead of catching up in a burst.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn per_second(rate: u32) -> Self {
        Self::new(interval_for_rate(rate))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true (and schedules the next deadline) when due
    pub fn ready(&mut self, now: Instant) -> bool {
        let next = match self.next_due {
            Some(due) if now < due => return false,
            Some(due) => due + self.interval,
            None => now + self.interval,
        };
        self.next_due = Some(if next <= now { now + self.interval } else { next });
        true
    }
}
