//! Domain Errors
//!
//! Error types shared by the ports and the application services.

/// Failure talking to the geocoding provider.
///
/// Every variant is transient from the caller's point of view: the lookup
/// may succeed on a later attempt, so none of them may be cached.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Failure in a persistence adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Error returned by a geolocation lookup.
///
/// Empty input and confirmed "no match" are not errors; they resolve to None.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("geocoding provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),
}

/// Error returned when starting or running a synchronization.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("geolocation sync is already running")]
    Busy,
    #[error("document store failure: {0}")]
    Store(#[from] StoreError),
}
