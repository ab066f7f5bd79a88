//! Application Layer
//!
//! Use cases orchestrating the domain ports: single lookups, the bulk
//! synchronization job and the write-path enrichment hook.

mod geo_enrichment;
mod geolocation_service;
mod geolocation_sync;
mod intercepted_store;

pub use geo_enrichment::GeoEnrichmentInterceptor;
pub use geolocation_service::GeolocationService;
pub use geolocation_sync::{GeolocationSyncJob, SyncOptions};
pub use intercepted_store::InterceptedDocumentStore;
