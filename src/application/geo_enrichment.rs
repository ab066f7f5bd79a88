//! Geo Enrichment Interceptor
//!
//! Before-write hook that fills in coordinates for records carrying a
//! postal code. A failed lookup never blocks the write.
//!
//! Updates are partial: a payload that changes only the postal code or only
//! the country is resolved together with the other half from the stored
//! document. Payloads touching neither are left alone.

use crate::application::GeolocationService;
use crate::domain::entities::{DocumentData, GeoDocument};
use crate::domain::ports::{WriteInterceptor, WriteKind};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;
use std::sync::Arc;

pub struct GeoEnrichmentInterceptor {
    service: Arc<GeolocationService>,
    collections: Vec<Collection>,
}

impl GeoEnrichmentInterceptor {
    /// Enrich writes to the users collection.
    pub fn new(service: Arc<GeolocationService>) -> Self {
        Self::for_collections(service, vec![Collection::Users])
    }

    pub fn for_collections(service: Arc<GeolocationService>, collections: Vec<Collection>) -> Self {
        Self {
            service,
            collections,
        }
    }
}

#[async_trait]
impl WriteInterceptor for GeoEnrichmentInterceptor {
    async fn before_write(
        &self,
        collection: Collection,
        kind: WriteKind,
        data: &mut DocumentData,
        existing: Option<&GeoDocument>,
    ) {
        if !self.collections.contains(&collection) {
            return;
        }
        let Some((postal_code, country_code)) = lookup_input(data, existing) else {
            return;
        };

        match self
            .service
            .resolve(&postal_code, country_code.as_deref())
            .await
        {
            Ok(Some(point)) => {
                tracing::debug!("enriched {} {:?} with {:?}", collection, kind, point);
                data.geo = Some(point);
            }
            Ok(None) => {
                tracing::debug!("no location for postal code {} in {}", postal_code, collection);
            }
            Err(e) => {
                tracing::warn!(
                    "geo enrichment for {} {:?} failed, writing without coordinates: {}",
                    collection,
                    kind,
                    e
                );
            }
        }
    }
}

/// Postal code and country to resolve for this write, merging the payload
/// over the stored document.
fn lookup_input(
    data: &DocumentData,
    existing: Option<&GeoDocument>,
) -> Option<(String, Option<String>)> {
    let country_code = data
        .country_code
        .as_deref()
        .filter(|c| !c.trim().is_empty());

    let postal_code = match (&data.postal_code, existing) {
        (Some(_), _) => data.postal_code(),
        (None, Some(doc)) if country_code.is_some() => doc.postal_code(),
        (None, _) => None,
    }?;

    let country_code = country_code
        .or_else(|| existing.and_then(|doc| doc.country_code.as_deref()))
        .map(str::to_string);

    Some((postal_code.to_string(), country_code))
}
