//! Geo Cache Store Port
//!
//! Defines the interface for persisting lookup results per postal code.

use crate::domain::entities::{GeoCacheEntry, GeoKey};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Outcome of writing a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entry was stored
    Inserted,
    /// Another writer stored an entry for this key first; the existing
    /// entry was kept
    AlreadyPresent,
}

/// Keyed store of resolved and negative lookups.
///
/// Implementations must enforce key uniqueness: after any sequence of
/// concurrent inserts there is at most one entry per key.
#[async_trait]
pub trait GeoCacheStore: Send + Sync {
    /// Get the entry for a key, if one was ever written.
    async fn get(&self, key: &GeoKey) -> Result<Option<GeoCacheEntry>, StoreError>;

    /// Store an entry unless one already exists for its key.
    async fn insert(&self, entry: GeoCacheEntry) -> Result<InsertOutcome, StoreError>;

    /// Get the total number of cached entries.
    async fn count(&self) -> Result<usize, StoreError>;
}
