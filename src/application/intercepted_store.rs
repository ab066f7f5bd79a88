//! Intercepted Document Store
//!
//! Wraps a DocumentStore and runs registered before-write interceptors on
//! every create and update. Reads pass straight through.

use crate::domain::entities::{DocumentData, GeoDocument};
use crate::domain::errors::StoreError;
use crate::domain::ports::{DocumentFilter, DocumentStore, WriteInterceptor, WriteKind};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;
use std::sync::Arc;

/// Document store decorated with an ordered list of write interceptors.
pub struct InterceptedDocumentStore {
    inner: Arc<dyn DocumentStore>,
    interceptors: Vec<Arc<dyn WriteInterceptor>>,
}

impl InterceptedDocumentStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            interceptors: Vec::new(),
        }
    }

    /// Register an interceptor. Interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn WriteInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    async fn intercept(
        &self,
        collection: Collection,
        kind: WriteKind,
        data: &mut DocumentData,
        existing: Option<&GeoDocument>,
    ) {
        for interceptor in &self.interceptors {
            interceptor.before_write(collection, kind, data, existing).await;
        }
    }
}

#[async_trait]
impl DocumentStore for InterceptedDocumentStore {
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<GeoDocument>, StoreError> {
        self.inner.find(filter).await
    }

    async fn create(
        &self,
        collection: Collection,
        mut data: DocumentData,
    ) -> Result<GeoDocument, StoreError> {
        self.intercept(collection, WriteKind::Create, &mut data, None)
            .await;
        self.inner.create(collection, data).await
    }

    async fn update(&self, id: &str, mut data: DocumentData) -> Result<GeoDocument, StoreError> {
        // Update payloads carry neither the collection nor the unchanged
        // fields; interceptors get the stored document for both.
        let existing = self
            .inner
            .find(&DocumentFilter::id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        self.intercept(existing.collection, WriteKind::Update, &mut data, Some(&existing))
            .await;
        self.inner.update(id, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::DashMapDocumentStore;
    use parking_lot::Mutex;

    /// Records every call and tags the payload's breeder id.
    #[derive(Default)]
    struct RecordingInterceptor {
        seen: Mutex<Vec<(Collection, WriteKind)>>,
        existing: Mutex<Vec<Option<GeoDocument>>>,
    }

    #[async_trait]
    impl WriteInterceptor for RecordingInterceptor {
        async fn before_write(
            &self,
            collection: Collection,
            kind: WriteKind,
            data: &mut DocumentData,
            existing: Option<&GeoDocument>,
        ) {
            self.seen.lock().push((collection, kind));
            self.existing.lock().push(existing.cloned());
            data.breeder_id = Some("tagged".to_string());
        }
    }

    fn store_with(
        interceptor: Arc<RecordingInterceptor>,
    ) -> (Arc<DashMapDocumentStore>, InterceptedDocumentStore) {
        let inner = Arc::new(DashMapDocumentStore::new());
        let store = InterceptedDocumentStore::new(inner.clone()).with_interceptor(interceptor);
        (inner, store)
    }

    #[tokio::test]
    async fn test_create_runs_interceptors() {
        let interceptor = Arc::new(RecordingInterceptor::default());
        let (inner, store) = store_with(interceptor.clone());

        let doc = store
            .create(Collection::Users, DocumentData::default())
            .await
            .unwrap();

        assert_eq!(doc.breeder_id.as_deref(), Some("tagged"));
        assert_eq!(inner.get(&doc.id).unwrap().breeder_id.as_deref(), Some("tagged"));
        assert_eq!(
            *interceptor.seen.lock(),
            vec![(Collection::Users, WriteKind::Create)]
        );
        assert_eq!(*interceptor.existing.lock(), vec![None]);
    }

    #[tokio::test]
    async fn test_update_passes_stored_collection() {
        let interceptor = Arc::new(RecordingInterceptor::default());
        let (inner, store) = store_with(interceptor.clone());
        let doc = inner
            .create(
                Collection::Breeders,
                DocumentData {
                    postal_code: Some("1010".to_string()),
                    country_code: Some("AT".to_string()),
                    ..DocumentData::default()
                },
            )
            .await
            .unwrap();

        store.update(&doc.id, DocumentData::default()).await.unwrap();

        assert_eq!(
            *interceptor.seen.lock(),
            vec![(Collection::Breeders, WriteKind::Update)]
        );
        let existing = interceptor.existing.lock();
        let stored = existing[0].as_ref().unwrap();
        assert_eq!(stored.id, doc.id);
        assert_eq!(stored.country_code.as_deref(), Some("AT"));
        assert_eq!(stored.postal_code.as_deref(), Some("1010"));
    }

    #[tokio::test]
    async fn test_update_missing_document_skips_interceptors() {
        let interceptor = Arc::new(RecordingInterceptor::default());
        let (_inner, store) = store_with(interceptor.clone());

        let result = store.update("missing", DocumentData::default()).await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(interceptor.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_find_passes_through() {
        let (inner, store) = store_with(Arc::new(RecordingInterceptor::default()));
        inner
            .create(Collection::Dogs, DocumentData::default())
            .await
            .unwrap();

        let docs = store.find(&DocumentFilter::default()).await.unwrap();
        assert_eq!(docs.len(), 1);
    }
}
