//! Polled interval timers.
//!
//! Every periodic routine of the agent (routing, perception, hazard checks,
//! waypoints, decay, look-around) is an accumulator advanced once per tick.

/// Accumulates elapsed time and fires once `interval` has passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalTimer {
    elapsed: f32,
    interval: f32,
}

impl IntervalTimer {
    /// A timer that first fires after a full interval.
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            elapsed: 0.0,
            interval: interval.max(0.0),
        }
    }

    /// A timer that fires on its first advance.
    #[must_use]
    pub fn primed(interval: f32) -> Self {
        let interval = interval.max(0.0);
        Self {
            elapsed: interval,
            interval,
        }
    }

    /// Advance by `dt`. When the interval has elapsed, returns the
    /// accumulated time and starts over.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.interval {
            let fired = self.elapsed;
            self.elapsed = 0.0;
            Some(fired)
        } else {
            None
        }
    }

    /// Start over without firing.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Time accumulated since the last firing.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Firing interval.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Change the interval, keeping the accumulated time.
    pub fn set_interval(&mut self, interval: f32) {
        self.interval = interval.max(0.0);
    }
}
