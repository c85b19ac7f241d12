//! # License Registry
//!
//! Owns every license record. Each record sits behind its own mutex so
//! operations on different licenses never contend. Identifiers are dense and
//! start at 1; a new license is inserted before its identifier is returned,
//! and every smaller identifier is already visible.

use std::sync::Arc;

use dashmap::DashMap;
use lce_core::LicenseId;
use lce_state::License;
use parking_lot::Mutex;

/// Handle to one license record.
pub type LicenseHandle = Arc<Mutex<License>>;

/// Concurrent map of license records.
#[derive(Debug)]
pub struct LicenseRegistry {
    licenses: DashMap<LicenseId, LicenseHandle>,
    /// Next identifier. Held across the insert so ids appear in order.
    next_id: Mutex<u64>,
}

impl Default for LicenseRegistry {
    fn default() -> Self {
        Self {
            licenses: DashMap::new(),
            next_id: Mutex::new(1),
        }
    }
}

impl LicenseRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next identifier to `license`, store it, and return the id.
    /// Only creation is serialized here; lookups never take this lock.
    pub fn register(&self, mut license: License) -> LicenseId {
        let mut next = self.next_id.lock();
        let id = LicenseId(*next);
        license.id = id;
        self.licenses.insert(id, Arc::new(Mutex::new(license)));
        *next += 1;
        id
    }

    /// The handle for `id`. The map shard lock is released before returning.
    pub fn get(&self, id: LicenseId) -> Option<LicenseHandle> {
        self.licenses.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// A copy of the license record.
    pub fn snapshot(&self, id: LicenseId) -> Option<License> {
        self.get(id).map(|handle| handle.lock().clone())
    }

    /// Number of licenses stored.
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    /// Whether no license has been created yet.
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}
