mod dashmap_document_store;
mod dashmap_geo_cache_store;
mod nominatim_geo_provider;
mod sqlite_document_store;
mod sqlite_geo_cache_store;

pub use dashmap_document_store::DashMapDocumentStore;
pub use dashmap_geo_cache_store::DashMapGeoCacheStore;
pub use nominatim_geo_provider::{NominatimConfig, NominatimGeoProvider};
pub use sqlite_document_store::SqliteDocumentStore;
pub use sqlite_geo_cache_store::SqliteGeoCacheStore;
