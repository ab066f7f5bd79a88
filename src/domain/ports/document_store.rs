//! Document Store Port
//!
//! Defines the interface to the content store holding breeders, users and
//! dogs. Only the operations the geolocation features need are exposed.

use crate::domain::entities::{DocumentData, GeoDocument};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::Collection;
use async_trait::async_trait;

/// Selection criteria for [`DocumentStore::find`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub id: Option<String>,
    pub collection: Option<Collection>,
    /// Only documents with a non-blank postal code
    pub with_postal_code: bool,
    /// Only documents without coordinates
    pub missing_geo: bool,
    /// Only documents with coordinates
    pub with_geo: bool,
}

impl DocumentFilter {
    /// All documents of one collection.
    pub fn collection(collection: Collection) -> Self {
        Self {
            collection: Some(collection),
            ..Self::default()
        }
    }

    /// The single document with this id.
    pub fn id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_postal_code(mut self) -> Self {
        self.with_postal_code = true;
        self
    }

    pub fn missing_geo(mut self) -> Self {
        self.missing_geo = true;
        self
    }

    pub fn with_geo(mut self) -> Self {
        self.with_geo = true;
        self
    }

    /// Check a document against this filter.
    pub fn matches(&self, doc: &GeoDocument) -> bool {
        if let Some(id) = &self.id {
            if &doc.id != id {
                return false;
            }
        }
        if let Some(c) = self.collection {
            if doc.collection != c {
                return false;
            }
        }
        if self.with_postal_code && doc.postal_code().is_none() {
            return false;
        }
        if self.missing_geo && doc.has_geo() {
            return false;
        }
        if self.with_geo && !doc.has_geo() {
            return false;
        }
        true
    }
}

/// Repository for content documents.
///
/// This is an outbound port; the content store itself is an external
/// collaborator.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get all documents matching the filter.
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<GeoDocument>, StoreError>;

    /// Create a document in a collection.
    async fn create(
        &self,
        collection: Collection,
        data: DocumentData,
    ) -> Result<GeoDocument, StoreError>;

    /// Update an existing document. Fields left `None` are unchanged.
    async fn update(&self, id: &str, data: DocumentData) -> Result<GeoDocument, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::GeoPoint;

    fn doc(collection: Collection, zip: Option<&str>, geo: bool) -> GeoDocument {
        GeoDocument {
            id: "d1".to_string(),
            collection,
            postal_code: zip.map(str::to_string),
            country_code: None,
            geo: geo.then(|| GeoPoint::new(52.52, 13.405)),
            breeder_id: None,
        }
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = DocumentFilter::default();
        assert!(filter.matches(&doc(Collection::Users, None, false)));
        assert!(filter.matches(&doc(Collection::Dogs, Some("10115"), true)));
    }

    #[test]
    fn test_filter_by_collection() {
        let filter = DocumentFilter::collection(Collection::Breeders);
        assert!(filter.matches(&doc(Collection::Breeders, None, false)));
        assert!(!filter.matches(&doc(Collection::Users, None, false)));
    }

    #[test]
    fn test_filter_needing_geo() {
        let filter = DocumentFilter::collection(Collection::Users)
            .with_postal_code()
            .missing_geo();

        assert!(filter.matches(&doc(Collection::Users, Some("10115"), false)));
        assert!(!filter.matches(&doc(Collection::Users, Some("10115"), true)));
        assert!(!filter.matches(&doc(Collection::Users, Some("  "), false)));
        assert!(!filter.matches(&doc(Collection::Users, None, false)));
    }

    #[test]
    fn test_filter_by_id() {
        let filter = DocumentFilter::id("d1");
        assert!(filter.matches(&doc(Collection::Dogs, None, false)));

        let filter = DocumentFilter::id("d2");
        assert!(!filter.matches(&doc(Collection::Dogs, None, false)));

        let filter = DocumentFilter {
            collection: Some(Collection::Users),
            ..DocumentFilter::id("d1")
        };
        assert!(!filter.matches(&doc(Collection::Dogs, None, false)));
    }

    #[test]
    fn test_filter_with_geo() {
        let filter = DocumentFilter::default().with_geo();
        assert!(filter.matches(&doc(Collection::Breeders, None, true)));
        assert!(!filter.matches(&doc(Collection::Breeders, None, false)));
    }
}
