//! # lce-engine — Licensing Agreement Engine
//!
//! Ties the license state machine to storage, payouts, and observability:
//!
//! - **Engine** (`engine.rs`): [`LicenseEngine`], the thirteen protocol
//!   operations plus read-only queries.
//! - **Registry** (`registry.rs`): per-license locks in a concurrent map,
//!   dense identifiers assigned in creation order.
//! - **Treasury** (`treasury.rs`): the [`Treasury`] payout seam and an
//!   in-memory implementation.
//! - **Events** (`events.rs`): [`LicenseEvent`], [`EventSink`], and the
//!   in-memory and `tracing` sinks.
//! - **Clock** (`clock.rs`): wall and manual clocks for building
//!   [`CallContext`](lce_core::CallContext)s.
//! - **Config** (`config.rs`) and **Telemetry** (`telemetry.rs`): YAML
//!   configuration and subscriber setup.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use lce_core::{Address, Amount, CallContext, Timestamp, WorkHash};
//! use lce_engine::{EventLog, InMemoryTreasury, LicenseEngine};
//! use lce_state::LicenseTerms;
//!
//! let treasury = Arc::new(InMemoryTreasury::new());
//! let engine = LicenseEngine::with_defaults(treasury.clone(), Arc::new(EventLog::new()));
//!
//! let licensor = Address::from_bytes([1; 20]);
//! let licensee = Address::from_bytes([2; 20]);
//! let start = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
//! let end = start.checked_add_secs(30 * 24 * 60 * 60).unwrap();
//! let terms = LicenseTerms::new(
//!     WorkHash::of_content(b"chapter one"),
//!     Amount::new(1),
//!     Amount::new(2),
//!     3_600,
//!     start,
//!     end,
//! );
//!
//! let id = engine.new_license(&CallContext::new(licensor, start), terms).unwrap();
//! engine
//!     .sign_license(&CallContext::new(licensee, start), id, licensee, Amount::new(3))
//!     .unwrap();
//! engine.withdraw_license_fee(&CallContext::new(licensor, start), id).unwrap();
//! assert_eq!(treasury.balance_of(&licensor), Amount::new(1));
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod telemetry;
pub mod treasury;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::LicenseEngine;
pub use error::{EngineError, EngineResult};
pub use events::{EventLog, EventSink, LicenseEvent, TracingSink, Transfer, TransferKind};
pub use registry::{LicenseHandle, LicenseRegistry};
pub use telemetry::TelemetryConfig;
pub use treasury::{InMemoryTreasury, Treasury, TreasuryError};
