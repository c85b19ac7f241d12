//! # Engine Error Types

use lce_core::{Address, Amount, ErrorKind, LicenseId};
use lce_state::{LicenseError, Operation};
use thiserror::Error;

use crate::treasury::TreasuryError;

/// Errors returned by [`LicenseEngine`](crate::LicenseEngine) operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No license with this identifier.
    #[error("{0} not found")]
    NotFound(LicenseId),

    /// The license state machine rejected the operation.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// The treasury refused a payout. Nothing was recorded as paid, the
    /// tranche is still held, and the call may be retried.
    #[error("{operation} on {license_id}: payout of {amount} to {payee} refused: {source}")]
    TransferFailed {
        /// The license.
        license_id: LicenseId,
        /// The operation that produced the payout.
        operation: Operation,
        /// Intended recipient.
        payee: Address,
        /// Amount that was not paid.
        amount: Amount,
        /// The treasury's refusal.
        #[source]
        source: TreasuryError,
    },

    /// The treasury paid but the release could not be recorded. The escrow
    /// no longer matches the treasury and needs manual reconciliation.
    #[error("{operation} on {license_id}: payout made but not recorded: {source}")]
    PayoutNotRecorded {
        /// The license.
        license_id: LicenseId,
        /// The operation that produced the payout.
        operation: Operation,
        /// Why recording failed.
        #[source]
        source: LicenseError,
    },

    /// The configuration is invalid or could not be loaded.
    #[error("invalid engine configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Protocol classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::License(e) => e.kind(),
            Self::TransferFailed { .. } | Self::PayoutNotRecorded { .. } => ErrorKind::TransferFailed,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
