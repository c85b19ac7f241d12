//! # Breach Resolution Timing
//!
//! The dispute protocol is a race between three parties, refereed by the
//! clock:
//!
//! ```text
//! notice ──(time_to_remove)──▶ removal deadline ──▶ arbiter may declare breach
//!                                    │
//!                                    └──(return grace)──▶ licensee may reclaim
//!                                                         breach fee if no breach
//! breach declared ──(breach claim window)──▶ licensor may claim breach fee
//! signing ──(time_to_remove + return grace)──▶ licensee may reclaim breach
//!                                              fee if no notice is outstanding
//! ```
//!
//! All deadlines are inclusive. Every sum is checked; a deadline that would
//! overflow is `None` and is never reached.

use lce_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Upper bound for any configured window: 100 years.
pub const MAX_WINDOW_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Engine-wide dispute windows, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisputeWindows {
    /// Delay between a breach declaration and the licensor's claim on the
    /// breach fee.
    pub breach_claim_window_secs: u64,
    /// Delay after which the licensee may reclaim an unforfeited breach fee,
    /// counted from the removal deadline of an outstanding notice, or from
    /// signing plus the takedown period when no notice is outstanding.
    pub return_grace_window_secs: u64,
}

impl Default for DisputeWindows {
    fn default() -> Self {
        Self {
            breach_claim_window_secs: 24 * 60 * 60,
            return_grace_window_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl DisputeWindows {
    /// Validate the windows. Returns a list of error messages (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.return_grace_window_secs == 0 {
            errors.push(
                "return_grace_window_secs must be > 0 so the arbiter can act after the removal deadline"
                    .to_string(),
            );
        }
        if self.breach_claim_window_secs > MAX_WINDOW_SECS {
            errors.push(format!(
                "breach_claim_window_secs ({}) exceeds maximum {MAX_WINDOW_SECS}",
                self.breach_claim_window_secs
            ));
        }
        if self.return_grace_window_secs > MAX_WINDOW_SECS {
            errors.push(format!(
                "return_grace_window_secs ({}) exceeds maximum {MAX_WINDOW_SECS}",
                self.return_grace_window_secs
            ));
        }
        errors
    }
}

/// The dispute-relevant fields of one license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisputeTimeline {
    /// Takedown grace period agreed at creation.
    pub time_to_remove_secs: u64,
    /// When the outstanding unauthorized-publication notice was raised.
    pub time_of_notification: Option<Timestamp>,
    /// When the arbiter declared the breach.
    pub breach_declared_at: Option<Timestamp>,
    /// When the licensee signed.
    pub signed_at: Option<Timestamp>,
}

/// Computes the protocol deadlines for a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreachResolver {
    windows: DisputeWindows,
}

impl BreachResolver {
    /// Create a resolver over the given windows.
    pub fn new(windows: DisputeWindows) -> Self {
        Self { windows }
    }

    /// The configured windows.
    pub fn windows(&self) -> &DisputeWindows {
        &self.windows
    }

    /// `time_of_notification + time_to_remove`, if a notice is outstanding.
    pub fn removal_deadline(&self, timeline: &DisputeTimeline) -> Option<Timestamp> {
        timeline
            .time_of_notification?
            .checked_add_secs(timeline.time_to_remove_secs)
    }

    /// Whether the removal deadline of an outstanding notice has passed
    /// without a breach being declared.
    pub fn removal_overdue(&self, timeline: &DisputeTimeline, now: Timestamp) -> bool {
        timeline.breach_declared_at.is_none()
            && now.has_reached(self.removal_deadline(timeline))
    }

    /// When the licensor may claim the breach fee, if a breach was declared.
    pub fn breach_claim_opens_at(&self, timeline: &DisputeTimeline) -> Option<Timestamp> {
        timeline
            .breach_declared_at?
            .checked_add_secs(self.windows.breach_claim_window_secs)
    }

    /// When the licensee may reclaim the breach fee. `None` before signing,
    /// once a breach has been declared, or when the deadline overflows.
    ///
    /// With a notice outstanding the grace runs from its removal deadline.
    /// Otherwise it runs from `signed_at + time_to_remove`, the earliest
    /// point a notice raised at signing could have become a breach.
    pub fn return_opens_at(&self, timeline: &DisputeTimeline) -> Option<Timestamp> {
        if timeline.breach_declared_at.is_some() {
            return None;
        }
        let anchor = match timeline.time_of_notification {
            Some(_) => self.removal_deadline(timeline)?,
            None => timeline
                .signed_at?
                .checked_add_secs(timeline.time_to_remove_secs)?,
        };
        anchor.checked_add_secs(self.windows.return_grace_window_secs)
    }
}
