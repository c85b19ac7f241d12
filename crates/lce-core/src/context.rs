//! # Call Context
//!
//! The execution environment supplies the caller identity and the current
//! time to every engine operation. `CallContext` is that pair, passed
//! explicitly so tests can travel in time deterministically.

use serde::{Deserialize, Serialize};

use crate::identity::Address;
use crate::temporal::Timestamp;

/// Caller identity and current time for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Who is invoking the operation.
    pub caller: Address,
    /// When the operation executes.
    pub now: Timestamp,
}

impl CallContext {
    /// Create a context for `caller` at `now`.
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// The same caller at a different instant.
    pub fn at(&self, now: Timestamp) -> Self {
        Self { caller: self.caller, now }
    }

    /// A different caller at the same instant.
    pub fn as_caller(&self, caller: Address) -> Self {
        Self { caller, now: self.now }
    }
}
