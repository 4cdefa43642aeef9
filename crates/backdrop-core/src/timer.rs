//! Timer handles driven by the main loop.
//!
//! Every component owns the handles it schedules with and cancels the old
//! one before arming a new one, so a feature never runs two loops at once.
//! Handles never look at the clock themselves: the caller passes `now`.

use std::time::{Duration, Instant};

/// A repeating timer.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    /// An unarmed interval with the given period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Arm the timer so it first fires one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Cancel and re-arm with a new period.
    pub fn restart(&mut self, period: Duration, now: Instant) {
        self.cancel();
        self.period = period;
        self.start(now);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true when the timer is due, and schedules the next firing.
    ///
    /// Fires at most once per call. A loop that fell more than a whole
    /// period behind skips the missed firings instead of bursting.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.period;
                self.next_due = Some(if next <= now { now + self.period } else { next });
                true
            }
            _ => false,
        }
    }
}

/// A one-shot timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeout {
    due: Option<Instant>,
}

impl Timeout {
    /// Arm (or re-arm) the timeout to fire `delay` after `now`.
    pub fn set(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// Returns true exactly once, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
