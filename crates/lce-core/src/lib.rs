//! # lce-core — Foundational Types for the Licensing Engine
//!
//! Every other crate in the workspace depends on `lce-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `LicenseId`, `Address`,
//!    `Amount`, `WorkHash` — no bare integers or strings for identifiers or
//!    money.
//!
//! 2. **Checked arithmetic for money.** `Amount` exposes only checked
//!    addition and subtraction. Fee sums that overflow are rejected, never
//!    wrapped.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!    Deadline arithmetic is checked: an overflowing deadline is `None`.
//!
//! 4. **Explicit caller and time.** `CallContext` carries the caller identity
//!    and the current time into every operation. Nothing in the engine reads
//!    the wall clock or an ambient identity.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lce-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod context;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod work;

// Re-export primary types for ergonomic imports.
pub use amount::Amount;
pub use context::CallContext;
pub use error::{CoreError, ErrorKind};
pub use identity::{Address, LicenseId};
pub use temporal::Timestamp;
pub use work::WorkHash;
