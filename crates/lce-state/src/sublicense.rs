//! # Sublicensee Registry
//!
//! Ordered, append-only list of addresses the licensee has granted secondary
//! rights to. Duplicates are kept: granting the same party twice records two
//! grants, as it would on paper.

use lce_core::Address;
use serde::{Deserialize, Serialize};

/// Append-only sublicensee list for one license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SublicenseeRegistry {
    entries: Vec<Address>,
}

impl SublicenseeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sublicensee and return its index.
    pub fn add(&mut self, address: Address) -> usize {
        self.entries.push(address);
        self.entries.len() - 1
    }

    /// The sublicensee at `index`, in grant order.
    pub fn get(&self, index: usize) -> Option<Address> {
        self.entries.get(index).copied()
    }

    /// Number of grants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no grants have been made.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in grant order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter()
    }

    /// All grants in order.
    pub fn as_slice(&self) -> &[Address] {
        &self.entries
    }
}
