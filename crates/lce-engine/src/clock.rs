//! # Clocks
//!
//! The engine itself never reads the wall clock: every operation takes the
//! time from its [`CallContext`]. A [`Clock`] is how callers fill that in.

use lce_core::{Address, CallContext, Timestamp};
use parking_lot::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// A call context for `caller` at the current time.
    fn context(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.now())
    }
}

/// The UTC wall clock, truncated to seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// A clock stopped at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }

    /// Move forward by `secs` and return the new time. Returns `None` and
    /// leaves the clock alone if the result is not representable.
    pub fn advance(&self, secs: u64) -> Option<Timestamp> {
        let mut now = self.now.lock();
        let next = now.checked_add_secs(secs)?;
        *now = next;
        Some(next)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
