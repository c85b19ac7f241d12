//! # License Error Types
//!
//! State machine rejections carry the license, the operation, and the state
//! or role that caused the rejection.

use lce_arbitration::ArbitrationError;
use lce_core::{Address, ErrorKind, LicenseId, Timestamp};
use thiserror::Error;

use crate::license::{LicenseState, Operation, Role};

/// Errors that can occur during license lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// Creation or role parameters are malformed.
    #[error("invalid license terms: {reason}")]
    InvalidTerms {
        /// Why the terms were rejected.
        reason: String,
    },

    /// The caller does not hold the role the operation requires.
    #[error("{operation} on {license_id} requires the {required} (caller {caller})")]
    Unauthorized {
        /// The license.
        license_id: LicenseId,
        /// The attempted operation.
        operation: Operation,
        /// The role the operation requires.
        required: Role,
        /// Who called.
        caller: Address,
    },

    /// The operation is not valid in the current lifecycle state.
    #[error("cannot {operation} {license_id} in state {state}: {reason}")]
    InvalidTransition {
        /// The license.
        license_id: LicenseId,
        /// The attempted operation.
        operation: Operation,
        /// The current state.
        state: LicenseState,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// A time gate has not opened yet.
    #[error("{operation} on {license_id} not allowed before {}", fmt_deadline(.opens_at))]
    TooEarly {
        /// The license.
        license_id: LicenseId,
        /// The attempted operation.
        operation: Operation,
        /// When the gate opens; `None` if the deadline overflowed.
        opens_at: Option<Timestamp>,
        /// The time of the rejected call.
        now: Timestamp,
    },

    /// The escrow rejected the operation.
    #[error("escrow for {license_id} rejected {operation}: {source}")]
    Escrow {
        /// The license.
        license_id: LicenseId,
        /// The attempted operation.
        operation: Operation,
        /// The escrow error.
        #[source]
        source: ArbitrationError,
    },

    /// No sublicensee at the requested index.
    #[error("{license_id} has no sublicensee at index {index}")]
    NoSuchSublicensee {
        /// The license.
        license_id: LicenseId,
        /// The requested index.
        index: usize,
    },
}

fn fmt_deadline(opens_at: &Option<Timestamp>) -> String {
    match opens_at {
        Some(t) => t.to_string(),
        None => "a representable deadline".to_string(),
    }
}

impl LicenseError {
    /// Protocol classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTerms { .. } => ErrorKind::InvalidSpec,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. } => ErrorKind::WrongState,
            Self::TooEarly { .. } => ErrorKind::TooEarly,
            Self::Escrow { source, .. } => source.kind(),
            Self::NoSuchSublicensee { .. } => ErrorKind::NotFound,
        }
    }
}
