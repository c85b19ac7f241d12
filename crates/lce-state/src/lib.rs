//! # lce-state — License Lifecycle State Machine
//!
//! ## States
//!
//! ```text
//! Draft ──sign──▶ Signed ──set_unauthorized_publication──▶ Disputed
//!                   ▲                                         │
//!                   └──────────── declare_removed ────────────┤
//!                                                             └─ declare_breach (stays Disputed)
//!
//! Signed | Disputed ──(license fee withdrawn AND breach fee settled)──▶ Settled
//! ```
//!
//! Every transition is a method on [`License`] taking the caller's
//! [`CallContext`](lce_core::CallContext). Each method runs all of its guards
//! before touching any field, so a rejected call leaves the record exactly
//! as it was.
//!
//! - **License** (`license.rs`): the agreement record and its transitions.
//! - **Sublicense** (`sublicense.rs`): ordered, append-only sublicensee list.
//! - **Error** (`error.rs`): [`LicenseError`] with protocol classification.

pub mod error;
pub mod license;
pub mod sublicense;

pub use error::LicenseError;
pub use license::{
    License, LicenseState, LicenseTerms, LicenseTransitionRecord, Operation, Payout, Role,
};
pub use sublicense::SublicenseeRegistry;
