//! hzd-geo Library
//!
//! Postal code geolocation for breeder and member records. This module
//! exposes the components for use in integration tests and as a library.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{
    GeoEnrichmentInterceptor, GeolocationService, GeolocationSyncJob, InterceptedDocumentStore,
    SyncOptions,
};
pub use config::load_config;
pub use domain::entities::{GeoCacheEntry, GeoDocument, GeoKey, GeoPoint, GeoResult, SyncStatus};
pub use domain::errors::{GeoError, ProviderError, StoreError, SyncError};
pub use domain::ports::{DocumentStore, GeoCacheStore, GeoProvider, WriteInterceptor};
pub use domain::value_objects::{Collection, CountryCode};
