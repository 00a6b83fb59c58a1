//! Countdown timers owned by a game instance

use std::time::Duration;

/// A one-shot countdown driven by elapsed time
#[derive(Debug, Clone, Default)]
pub struct Timer {
    duration: Duration,
    remaining: Option<Duration>,
}

impl Timer {
    /// Start counting down `duration`, replacing any pending countdown
    pub fn arm(&mut self, duration: Duration) {
        self.duration = duration;
        self.remaining = Some(duration);
    }

    /// Arm only if nothing is pending. Returns true if it was armed.
    pub fn arm_if_idle(&mut self, duration: Duration) -> bool {
        if self.is_pending() {
            return false;
        }
        self.arm(duration);
        true
    }

    /// Re-arm at the full length of the last countdown
    pub fn rearm(&mut self) {
        if self.is_pending() {
            self.remaining = Some(self.duration);
        }
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Count down. When the timer fires it goes idle and the unused part
    /// of `elapsed` is returned.
    pub fn advance(&mut self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.remaining?;
        if elapsed >= remaining {
            self.remaining = None;
            Some(elapsed - remaining)
        } else {
            self.remaining = Some(remaining - elapsed);
            None
        }
    }
}
