//! Geolocation Service - Main application use case
//!
//! Resolves a postal code to coordinates: cache first, provider on a miss,
//! and every definitive provider answer is written back to the cache.
//! Both the write-path hook and the read-path query go through here.

use crate::domain::entities::{GeoCacheEntry, GeoKey, GeoResult};
use crate::domain::errors::GeoError;
use crate::domain::ports::{GeoCacheStore, GeoProvider, InsertOutcome};
use crate::domain::value_objects::CountryCode;
use std::sync::Arc;

/// Geolocation service.
///
/// Confirmed "no match" answers are cached as negative entries so the
/// provider is asked at most once per key. Provider failures are never
/// cached and surface as [`GeoError::ProviderUnavailable`].
pub struct GeolocationService {
    provider: Arc<dyn GeoProvider>,
    cache: Arc<dyn GeoCacheStore>,
    default_country: CountryCode,
}

impl GeolocationService {
    /// Create a new geolocation service.
    pub fn new(
        provider: Arc<dyn GeoProvider>,
        cache: Arc<dyn GeoCacheStore>,
        default_country: CountryCode,
    ) -> Self {
        Self {
            provider,
            cache,
            default_country,
        }
    }

    /// Country used when a request carries none.
    pub fn default_country(&self) -> &CountryCode {
        &self.default_country
    }

    /// Resolve a postal code.
    ///
    /// # Arguments
    /// * `postal_code` - Raw postal code; blank input resolves to None without I/O
    /// * `country_code` - Optional ISO code; defaults to the configured country
    pub async fn resolve(
        &self,
        postal_code: &str,
        country_code: Option<&str>,
    ) -> Result<GeoResult, GeoError> {
        match GeoKey::new(postal_code, country_code, &self.default_country) {
            Some(key) => self.resolve_key(&key).await,
            None => Ok(None),
        }
    }

    /// Resolve an already normalized key.
    pub async fn resolve_key(&self, key: &GeoKey) -> Result<GeoResult, GeoError> {
        match self.cache.get(key).await {
            Ok(Some(entry)) => {
                tracing::debug!("cache hit for {} ({})", key, entry.source().as_str());
                return Ok(entry.point());
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("cache read failed for {}, treating as miss: {}", key, e);
            }
        }

        let result = match self.provider.lookup(key).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("geocoding {} failed: {}", key, e);
                return Err(e.into());
            }
        };

        let entry = match result {
            Some(point) => GeoCacheEntry::resolved(key.clone(), point),
            None => GeoCacheEntry::negative(key.clone()),
        };
        self.store(entry).await;

        Ok(result)
    }

    async fn store(&self, entry: GeoCacheEntry) {
        let key = entry.key().clone();
        let source = entry.source();

        match self.cache.insert(entry).await {
            Ok(InsertOutcome::Inserted) => {
                tracing::info!("cached {} as {}", key, source.as_str());
            }
            Ok(InsertOutcome::AlreadyPresent) => {
                tracing::debug!("{} already cached by a concurrent lookup", key);
            }
            Err(e) => {
                tracing::error!("failed to cache {}: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GeoPoint, GeoSource};
    use crate::domain::errors::{ProviderError, StoreError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ===== Mock Implementations =====

    /// Provider that answers from a fixed table and counts calls.
    struct MockProvider {
        known: HashMap<String, GeoPoint>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(known: &[(&str, GeoPoint)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(zip, p)| (zip.to_string(), *p))
                    .collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoProvider for MockProvider {
        async fn lookup(&self, key: &GeoKey) -> Result<GeoResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Status(503));
            }
            Ok(self.known.get(&key.postal_code).copied())
        }
    }

    #[derive(Default)]
    struct MockCache {
        entries: Mutex<HashMap<GeoKey, GeoCacheEntry>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MockCache {
        fn len(&self) -> usize {
            self.entries.lock().len()
        }

        fn entry(&self, key: &GeoKey) -> Option<GeoCacheEntry> {
            self.entries.lock().get(key).cloned()
        }
    }

    #[async_trait]
    impl GeoCacheStore for MockCache {
        async fn get(&self, key: &GeoKey) -> Result<Option<GeoCacheEntry>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Corrupt("unreadable".to_string()));
            }
            Ok(self.entries.lock().get(key).cloned())
        }

        async fn insert(&self, entry: GeoCacheEntry) -> Result<InsertOutcome, StoreError> {
            if self.fail_writes {
                return Err(StoreError::Corrupt("read-only".to_string()));
            }
            let mut entries = self.entries.lock();
            if entries.contains_key(entry.key()) {
                return Ok(InsertOutcome::AlreadyPresent);
            }
            entries.insert(entry.key().clone(), entry);
            Ok(InsertOutcome::Inserted)
        }

        async fn count(&self) -> Result<usize, StoreError> {
            Ok(self.len())
        }
    }

    fn berlin() -> GeoPoint {
        GeoPoint::new(52.52, 13.405)
    }

    fn service(provider: Arc<MockProvider>, cache: Arc<MockCache>) -> GeolocationService {
        GeolocationService::new(provider, cache, CountryCode::default())
    }

    fn de_key(zip: &str) -> GeoKey {
        GeoKey::new(zip, Some("DE"), &CountryCode::default()).unwrap()
    }

    // ===== Resolution Tests =====

    #[tokio::test]
    async fn test_resolve_known_code_caches_provider_entry() {
        let provider = Arc::new(MockProvider::new(&[("10115", berlin())]));
        let cache = Arc::new(MockCache::default());
        let svc = service(provider.clone(), cache.clone());

        let result = svc.resolve("10115", Some("DE")).await.unwrap();

        assert_eq!(result, Some(berlin()));
        assert_eq!(cache.len(), 1);
        let entry = cache.entry(&de_key("10115")).unwrap();
        assert_eq!(entry.source(), GeoSource::Provider);
        assert_eq!(entry.point(), Some(berlin()));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_is_cached_negative_once() {
        let provider = Arc::new(MockProvider::new(&[]));
        let cache = Arc::new(MockCache::default());
        let svc = service(provider.clone(), cache.clone());

        assert_eq!(svc.resolve("99999", Some("DE")).await.unwrap(), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.entry(&de_key("99999")).unwrap().source(),
            GeoSource::Negative
        );

        assert_eq!(svc.resolve("99999", Some("DE")).await.unwrap(), None);
        assert_eq!(svc.resolve(" 99999 ", Some("de")).await.unwrap(), None);

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = Arc::new(MockProvider::new(&[("10115", berlin())]));
        let cache = Arc::new(MockCache::default());
        let svc = service(provider.clone(), cache.clone());

        svc.resolve("10115", None).await.unwrap();
        let second = svc.resolve("10115", Some("D")).await.unwrap();

        assert_eq!(second, Some(berlin()));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_cached() {
        let provider = Arc::new(MockProvider::failing());
        let cache = Arc::new(MockCache::default());
        let svc = service(provider.clone(), cache.clone());

        let first = svc.resolve("10115", Some("DE")).await;
        assert!(matches!(
            first,
            Err(GeoError::ProviderUnavailable(ProviderError::Status(503)))
        ));
        assert_eq!(cache.len(), 0);

        let second = svc.resolve("10115", Some("DE")).await;
        assert!(second.is_err());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_postal_code_does_no_io() {
        let provider = Arc::new(MockProvider::new(&[]));
        let cache = Arc::new(MockCache::default());
        let svc = service(provider.clone(), cache.clone());

        assert_eq!(svc.resolve("", Some("DE")).await.unwrap(), None);
        assert_eq!(svc.resolve("   ", None).await.unwrap(), None);

        assert_eq!(provider.calls(), 0);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_cache_read_failure_falls_back_to_provider() {
        let provider = Arc::new(MockProvider::new(&[("10115", berlin())]));
        let cache = Arc::new(MockCache {
            fail_reads: true,
            ..MockCache::default()
        });
        let svc = service(provider.clone(), cache);

        assert_eq!(svc.resolve("10115", None).await.unwrap(), Some(berlin()));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_result() {
        let provider = Arc::new(MockProvider::new(&[("10115", berlin())]));
        let cache = Arc::new(MockCache {
            fail_writes: true,
            ..MockCache::default()
        });
        let svc = service(provider, cache.clone());

        assert_eq!(svc.resolve("10115", None).await.unwrap(), Some(berlin()));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_leave_one_entry() {
        let provider = Arc::new(MockProvider::new(&[("10115", berlin())]));
        let cache = Arc::new(MockCache::default());
        let svc = Arc::new(service(provider, cache.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move { svc.resolve("10115", Some("DE")).await }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), Some(berlin()));
        }

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_country() {
        let svc = service(
            Arc::new(MockProvider::new(&[])),
            Arc::new(MockCache::default()),
        );
        assert_eq!(svc.default_country().as_str(), "DE");
    }
}
