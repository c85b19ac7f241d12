//! # Protocol Events
//!
//! Every committed operation emits one [`LicenseEvent`]; every fund movement
//! (the signing deposit and each completed payout) emits one
//! [`LicenseEvent::Transfer`]. Rejected operations emit nothing.

use lce_core::{Address, Amount, LicenseId, Timestamp, WorkHash};
use lce_state::Role;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// What a transfer paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Licensee's payment into escrow at signing.
    Deposit,
    /// License fee to the licensor.
    LicenseFee,
    /// Forfeited breach fee to the licensor.
    BreachFeeForfeit,
    /// Breach fee back to the licensee.
    BreachFeeReturn,
}

/// A fund movement between license parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub license_id: LicenseId,
    pub from: Role,
    pub to: Role,
    pub amount: Amount,
    pub kind: TransferKind,
}

/// Notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LicenseEvent {
    Created {
        license_id: LicenseId,
        licensor: Address,
        work_hash: WorkHash,
        at: Timestamp,
    },
    ArbiterSet {
        license_id: LicenseId,
        arbiter: Address,
        at: Timestamp,
    },
    Signed {
        license_id: LicenseId,
        licensee: Address,
        at: Timestamp,
    },
    SublicenseeAdded {
        license_id: LicenseId,
        sublicensee: Address,
        index: usize,
    },
    CommentsCommissioned {
        license_id: LicenseId,
    },
    ApprovalGranted {
        license_id: LicenseId,
        at: Timestamp,
    },
    UnauthorizedPublication {
        license_id: LicenseId,
        notified_at: Timestamp,
    },
    RemovalDeclared {
        license_id: LicenseId,
        at: Timestamp,
    },
    BreachDeclared {
        license_id: LicenseId,
        at: Timestamp,
    },
    Transfer(Transfer),
}

impl LicenseEvent {
    /// The license the event concerns.
    pub fn license_id(&self) -> LicenseId {
        match self {
            Self::Created { license_id, .. }
            | Self::ArbiterSet { license_id, .. }
            | Self::Signed { license_id, .. }
            | Self::SublicenseeAdded { license_id, .. }
            | Self::CommentsCommissioned { license_id }
            | Self::ApprovalGranted { license_id, .. }
            | Self::UnauthorizedPublication { license_id, .. }
            | Self::RemovalDeclared { license_id, .. }
            | Self::BreachDeclared { license_id, .. } => *license_id,
            Self::Transfer(t) => t.license_id,
        }
    }

    /// Short event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::ArbiterSet { .. } => "arbiter_set",
            Self::Signed { .. } => "signed",
            Self::SublicenseeAdded { .. } => "sublicensee_added",
            Self::CommentsCommissioned { .. } => "comments_commissioned",
            Self::ApprovalGranted { .. } => "approval_granted",
            Self::UnauthorizedPublication { .. } => "unauthorized_publication",
            Self::RemovalDeclared { .. } => "removal_declared",
            Self::BreachDeclared { .. } => "breach_declared",
            Self::Transfer(_) => "transfer",
        }
    }
}

/// Receives engine events. Called with no license lock held.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LicenseEvent);
}

/// Logs every event through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LicenseEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(
                license_id = %event.license_id(),
                event = event.name(),
                %payload,
                "license event"
            ),
            Err(e) => tracing::warn!(event = event.name(), error = %e, "unserializable license event"),
        }
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<LicenseEvent>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event so far.
    pub fn snapshot(&self) -> Vec<LicenseEvent> {
        self.events.lock().clone()
    }

    /// Events concerning one license.
    pub fn for_license(&self, license_id: LicenseId) -> Vec<LicenseEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.license_id() == license_id)
            .cloned()
            .collect()
    }

    /// Every transfer so far.
    pub fn transfers(&self) -> Vec<Transfer> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                LicenseEvent::Transfer(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    /// Number of events recorded.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events as newline-delimited JSON.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for event in self.events.lock().iter() {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &LicenseEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: &LicenseEvent) {
        (**self).emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(id: u64, amount: u64) -> LicenseEvent {
        LicenseEvent::Transfer(Transfer {
            license_id: LicenseId(id),
            from: Role::Escrow,
            to: Role::Licensor,
            amount: Amount::new(amount),
            kind: TransferKind::LicenseFee,
        })
    }

    #[test]
    fn log_keeps_order_and_filters() {
        let log = EventLog::new();
        log.emit(&LicenseEvent::CommentsCommissioned {
            license_id: LicenseId(1),
        });
        log.emit(&transfer(2, 5));
        log.emit(&transfer(1, 7));

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_license(LicenseId(1)).len(), 2);
        let amounts: Vec<u64> = log.transfers().iter().map(|t| t.amount.units()).collect();
        assert_eq!(amounts, vec![5, 7]);
    }

    #[test]
    fn json_lines_are_tagged() {
        let log = EventLog::new();
        log.emit(&transfer(1, 1));
        let out = log.to_json_lines().unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"event\":\"transfer\""));
        assert!(out.contains("\"kind\":\"license_fee\""));
    }

    #[test]
    fn event_names() {
        assert_eq!(transfer(1, 1).name(), "transfer");
        assert_eq!(
            LicenseEvent::BreachDeclared {
                license_id: LicenseId(1),
                at: Timestamp::from_epoch_secs(0).unwrap(),
            }
            .name(),
            "breach_declared"
        );
    }
}
