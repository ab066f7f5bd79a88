//! Domain Layer
//!
//! Entities, value objects, errors and the ports the application depends on.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{GeoCacheEntry, GeoDocument, GeoKey, GeoPoint, GeoResult, GeoSource, SyncState, SyncStatus};
pub use value_objects::{Collection, CountryCode};
