//! DashMap Geo Cache Store
//!
//! Implements GeoCacheStore using DashMap for lock-free concurrent access.
//! Entries live for the lifetime of the process.

use crate::domain::entities::{GeoCacheEntry, GeoKey};
use crate::domain::errors::StoreError;
use crate::domain::ports::{GeoCacheStore, InsertOutcome};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory geolocation cache.
pub struct DashMapGeoCacheStore {
    entries: Arc<DashMap<GeoKey, GeoCacheEntry>>,
}

impl DashMapGeoCacheStore {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl Default for DashMapGeoCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoCacheStore for DashMapGeoCacheStore {
    async fn get(&self, key: &GeoKey) -> Result<Option<GeoCacheEntry>, StoreError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn insert(&self, entry: GeoCacheEntry) -> Result<InsertOutcome, StoreError> {
        match self.entries.entry(entry.key().clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}
