//! Geo Provider Port
//!
//! Defines the interface for resolving postal codes to coordinates.

use crate::domain::entities::{GeoKey, GeoResult};
use crate::domain::errors::ProviderError;
use async_trait::async_trait;

/// Resolver for postal code to coordinates.
///
/// This is an outbound port that abstracts the external geocoding service.
/// Implementations may use Nominatim, a commercial geocoder, or a fixture.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Look up the coordinates for a normalized key.
    ///
    /// Returns `Ok(None)` only when the provider affirmatively reports no
    /// match. Network failures, timeouts and non-2xx responses must be
    /// returned as errors so they are never mistaken for a negative result.
    async fn lookup(&self, key: &GeoKey) -> Result<GeoResult, ProviderError>;
}
