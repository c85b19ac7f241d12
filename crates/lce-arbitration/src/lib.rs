//! # lce-arbitration — Escrow and Breach Resolution
//!
//! - **Error** ([`error`]): Structured error hierarchy for escrow operations.
//!
//! - **Escrow** ([`escrow`]): Per-license custody of the signing deposit,
//!   split into a license-fee tranche and a breach-fee tranche, each released
//!   at most once.
//!
//! - **Breach** ([`breach`]): Timing policy for the dispute protocol: removal
//!   deadlines, the post-breach claim window, and the return grace window.
//!
//! ## Crate Policy
//!
//! - Depends on `lce-core` only. Knows nothing about callers or roles; the
//!   lifecycle state machine in `lce-state` authorizes every call made here.

pub mod breach;
pub mod error;
pub mod escrow;

// Error types
pub use error::ArbitrationError;

// Escrow custody
pub use escrow::{
    BreachFeeDisposition, EscrowAccount, EscrowStatus, EscrowTransaction, Release, ReleaseKind,
    TransactionId, TransactionType,
};

// Breach timing
pub use breach::{BreachResolver, DisputeTimeline, DisputeWindows};
