use std::time::{Duration, Instant};

/// Outcome of registering an unexpected exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashDecision {
    /// Schedule restart number `attempt` (1-based)
    Restart { attempt: u32 },
    /// Too many crashes inside the window
    GiveUp { crashes: u32 },
}

/// Crash bookkeeping for the auto-restart policy.
#[derive(Debug, Clone, Default)]
pub struct CrashRecord {
    count: u32,
    last_crash: Option<Instant>,
}

impl CrashRecord {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_crash(&self) -> Option<Instant> {
        self.last_crash
    }

    /// Register a crash at `now`.
    ///
    /// The counter starts over when the previous crash is older than
    /// `window`. Below `max_crashes` the crash is counted and a restart is
    /// granted; at the limit the record is left untouched and the caller
    /// must give up.
    pub fn register_crash(&mut self, now: Instant, window: Duration, max_crashes: u32) -> CrashDecision {
        if let Some(last) = self.last_crash
            && now.saturating_duration_since(last) > window
        {
            self.count = 0;
        }

        if self.count < max_crashes {
            self.count += 1;
            self.last_crash = Some(now);
            CrashDecision::Restart {
                attempt: self.count,
            }
        } else {
            CrashDecision::GiveUp {
                crashes: self.count,
            }
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_crash = None;
    }
}
