//! # Arbitration Error Types
//!
//! Every variant carries diagnostic context: the operation that failed, the
//! escrow status at the time of failure, and the amounts involved.

use lce_core::{Amount, ErrorKind};
use thiserror::Error;

/// Errors arising from escrow operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrationError {
    /// The deposit does not equal license fee plus breach fee.
    #[error("deposit of {actual} does not match required escrow amount {expected}")]
    DepositMismatch {
        /// License fee plus breach fee.
        expected: Amount,
        /// The amount offered.
        actual: Amount,
    },

    /// A tranche was already paid out.
    #[error("{tranche} already released from escrow")]
    AlreadyReleased {
        /// Which tranche (`license_fee` or `breach_fee`).
        tranche: String,
    },

    /// Escrow operation violated status preconditions.
    #[error("escrow cannot perform {operation} in status {status}")]
    InvalidEscrowOperation {
        /// The attempted operation (e.g., "deposit", "release_license_fee").
        operation: String,
        /// The current escrow status.
        status: String,
    },

    /// License fee plus breach fee does not fit in an amount.
    #[error("license fee {license_fee} plus breach fee {breach_fee} overflows")]
    FeeOverflow {
        /// The license fee.
        license_fee: Amount,
        /// The breach fee.
        breach_fee: Amount,
    },
}

impl ArbitrationError {
    /// Protocol classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DepositMismatch { .. } => ErrorKind::WrongDepositAmount,
            Self::AlreadyReleased { .. } => ErrorKind::AlreadySettled,
            Self::InvalidEscrowOperation { .. } => ErrorKind::WrongState,
            Self::FeeOverflow { .. } => ErrorKind::InvalidSpec,
        }
    }
}
