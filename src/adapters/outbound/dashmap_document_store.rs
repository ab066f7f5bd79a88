//! DashMap Document Store
//!
//! Implements DocumentStore in memory. Used for local runs without a
//! content store and by the integration tests.

use crate::domain::entities::{DocumentData, GeoDocument};
use crate::domain::errors::StoreError;
use crate::domain::ports::{DocumentFilter, DocumentStore};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory document store keyed by document id.
pub struct DashMapDocumentStore {
    documents: Arc<DashMap<String, GeoDocument>>,
}

impl DashMapDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
        }
    }

    /// Create a store pre-filled with documents.
    pub fn with_documents(docs: impl IntoIterator<Item = GeoDocument>) -> Self {
        let store = Self::new();
        for doc in docs {
            store.documents.insert(doc.id.clone(), doc);
        }
        store
    }

    /// Get a document by id.
    pub fn get(&self, id: &str) -> Option<GeoDocument> {
        self.documents.get(id).map(|e| e.value().clone())
    }

    /// Get the total number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for DashMapDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for DashMapDocumentStore {
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<GeoDocument>, StoreError> {
        let mut docs: Vec<GeoDocument> = self
            .documents
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn create(
        &self,
        collection: Collection,
        data: DocumentData,
    ) -> Result<GeoDocument, StoreError> {
        let doc = data.into_document(uuid::Uuid::new_v4().to_string(), collection);
        self.documents.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: &str, data: DocumentData) -> Result<GeoDocument, StoreError> {
        let mut entry = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        data.apply_to(entry.value_mut());
        Ok(entry.value().clone())
    }
}
