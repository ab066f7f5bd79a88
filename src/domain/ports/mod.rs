mod document_store;
mod geo_cache_store;
mod geo_provider;
mod write_interceptor;

pub use document_store::{DocumentFilter, DocumentStore};
pub use geo_cache_store::{GeoCacheStore, InsertOutcome};
pub use geo_provider::GeoProvider;
pub use write_interceptor::{WriteInterceptor, WriteKind};
