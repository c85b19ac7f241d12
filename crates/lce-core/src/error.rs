//! # Error Types — Structured Error Hierarchy
//!
//! `ErrorKind` is the protocol-level classification shared by every crate in
//! the workspace. Each crate keeps its own `thiserror` enum with diagnostic
//! context and maps it onto an `ErrorKind` through a `kind()` method, so
//! callers can branch on the failure class without matching nested enums.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed engine operation.
///
/// Every failure is terminal for the operation that produced it: no partial
/// state change and no partial fund movement survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed creation parameters.
    InvalidSpec,
    /// Unknown license id (or sublicensee index).
    NotFound,
    /// Wrong caller role for the operation.
    Unauthorized,
    /// Operation not valid in the current lifecycle state.
    WrongState,
    /// Signing payment differs from the fee sum.
    WrongDepositAmount,
    /// Time gate not yet satisfied. The caller may retry later.
    TooEarly,
    /// One-shot withdrawal replayed.
    AlreadySettled,
    /// The payout backend refused the transfer; nothing was paid and the
    /// tranche is still held.
    TransferFailed,
    /// Engine configuration is invalid.
    Config,
}

impl ErrorKind {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSpec => "INVALID_SPEC",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::WrongState => "WRONG_STATE",
            Self::WrongDepositAmount => "WRONG_DEPOSIT_AMOUNT",
            Self::TooEarly => "TOO_EARLY",
            Self::AlreadySettled => "ALREADY_SETTLED",
            Self::TransferFailed => "TRANSFER_FAILED",
            Self::Config => "CONFIG",
        }
    }

    /// Whether retrying the same call later can succeed without any other
    /// party acting first.
    pub fn is_time_based(&self) -> bool {
        matches!(self, Self::TooEarly)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while constructing core primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An address string was not `0x` followed by 40 hex digits.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A work hash string was not 64 hex digits (optionally `0x`-prefixed).
    #[error("invalid work hash {input:?}: {reason}")]
    InvalidWorkHash {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl CoreError {
    /// Every core construction failure is a malformed input.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidSpec
    }
}
