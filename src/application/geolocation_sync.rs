//! Geolocation Sync Job
//!
//! Backfills coordinates for every breeder and user that has a postal code
//! but no location, then lets dogs inherit their breeder's coordinates.
//! At most one run is active per job; progress is observable through
//! [`GeolocationSyncJob::status`] while it runs.

use crate::application::GeolocationService;
use crate::domain::entities::{DocumentData, GeoDocument, GeoPoint, SyncState, SyncStatus};
use crate::domain::errors::SyncError;
use crate::domain::ports::{DocumentFilter, DocumentStore};
use crate::domain::value_objects::Collection;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options for one synchronization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Re-resolve records that already have coordinates
    pub full_resync: bool,
    /// Records resolved in parallel (1 = sequential)
    pub concurrency: usize,
    /// Pause after each record
    pub record_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            full_resync: false,
            concurrency: 1,
            record_delay: Duration::from_millis(100),
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Resolved,
    Unresolved,
    Failed,
}

/// Bulk geolocation synchronization.
pub struct GeolocationSyncJob {
    service: Arc<GeolocationService>,
    documents: Arc<dyn DocumentStore>,
    status: Mutex<SyncStatus>,
}

impl GeolocationSyncJob {
    pub fn new(service: Arc<GeolocationService>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            service,
            documents,
            status: Mutex::new(SyncStatus::idle()),
        }
    }

    /// Snapshot of the current or most recent run.
    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    /// Run a synchronization to completion.
    ///
    /// Returns [`SyncError::Busy`] without touching the status when a run is
    /// already active.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncStatus, SyncError> {
        self.try_begin()?;
        self.drive(&options).await
    }

    /// Start a synchronization in the background.
    ///
    /// Returns the freshly started status, or [`SyncError::Busy`].
    pub fn start(self: &Arc<Self>, options: SyncOptions) -> Result<SyncStatus, SyncError> {
        let snapshot = self.try_begin()?;

        let job = Arc::clone(self);
        tokio::spawn(async move {
            let runner = Arc::clone(&job);
            // Failures are recorded in the status and logged by drive().
            let run = tokio::spawn(async move { runner.drive(&options).await });
            if let Err(e) = run.await {
                let reason = if e.is_panic() {
                    "sync task panicked".to_string()
                } else {
                    format!("sync task aborted: {}", e)
                };
                job.abandon(reason);
            }
        });

        Ok(snapshot)
    }

    /// Mark a run that died without finishing as failed, so it does not
    /// block later runs.
    fn abandon(&self, reason: String) {
        let mut status = self.status.lock();
        if !status.is_running() {
            return;
        }
        let now = Utc::now();
        status.finished_at = Some(now);
        status.duration_ms = status
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0) as u64);
        status.state = SyncState::Failed;
        tracing::error!(
            "geolocation sync failed after {} records: {}",
            status.processed,
            reason
        );
        status.last_error = Some(reason);
    }

    /// Check-and-set under a single lock acquisition.
    fn try_begin(&self) -> Result<SyncStatus, SyncError> {
        let mut status = self.status.lock();
        if status.is_running() {
            tracing::warn!("geolocation sync requested while a run is active");
            return Err(SyncError::Busy);
        }
        *status = SyncStatus::started();
        Ok(status.clone())
    }

    async fn drive(&self, options: &SyncOptions) -> Result<SyncStatus, SyncError> {
        let started = Instant::now();
        let result = self.execute(options).await;

        let mut status = self.status.lock();
        status.finished_at = Some(Utc::now());
        status.duration_ms = Some(started.elapsed().as_millis() as u64);

        match result {
            Ok(()) => {
                status.state = SyncState::Completed;
                tracing::info!(
                    "geolocation sync completed: processed={} resolved={} unresolved={} failed={} derived={} ({} ms)",
                    status.processed,
                    status.resolved,
                    status.unresolved,
                    status.failed,
                    status.derived,
                    status.duration_ms.unwrap_or_default()
                );
                Ok(status.clone())
            }
            Err(e) => {
                status.state = SyncState::Failed;
                status.last_error = Some(e.to_string());
                tracing::error!("geolocation sync failed after {} records: {}", status.processed, e);
                Err(e)
            }
        }
    }

    async fn execute(&self, options: &SyncOptions) -> Result<(), SyncError> {
        let mut targets = Vec::new();
        for collection in [Collection::Breeders, Collection::Users] {
            let mut filter = DocumentFilter::collection(collection).with_postal_code();
            if !options.full_resync {
                filter = filter.missing_geo();
            }
            let docs = self.documents.find(&filter).await?;
            tracing::info!("{} {} need geolocation", docs.len(), collection);
            targets.extend(docs);
        }

        self.status.lock().total = targets.len();

        let concurrency = options.concurrency.max(1);
        let pending: Vec<_> = targets
            .into_iter()
            .map(|doc| self.sync_document(doc, options.record_delay))
            .collect();
        let mut outcomes = std::pin::pin!(stream::iter(pending).buffer_unordered(concurrency));

        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome?;
            let mut status = self.status.lock();
            status.processed += 1;
            match outcome {
                RecordOutcome::Resolved => status.resolved += 1,
                RecordOutcome::Unresolved => status.unresolved += 1,
                RecordOutcome::Failed => status.failed += 1,
            }
        }

        self.sync_dogs(options).await
    }

    async fn sync_document(
        &self,
        doc: GeoDocument,
        delay: Duration,
    ) -> Result<RecordOutcome, SyncError> {
        let Some(postal_code) = doc.postal_code() else {
            return Ok(RecordOutcome::Unresolved);
        };

        let outcome = match self
            .service
            .resolve(postal_code, doc.country_code.as_deref())
            .await
        {
            Ok(Some(point)) => {
                self.documents
                    .update(&doc.id, DocumentData::geo(point))
                    .await?;
                RecordOutcome::Resolved
            }
            Ok(None) => {
                tracing::debug!("no location for {} {} ({})", doc.collection, doc.id, postal_code);
                RecordOutcome::Unresolved
            }
            Err(e) => {
                tracing::warn!("skipping {} {}: {}", doc.collection, doc.id, e);
                RecordOutcome::Failed
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(outcome)
    }

    /// Copy breeder coordinates onto their dogs.
    async fn sync_dogs(&self, options: &SyncOptions) -> Result<(), SyncError> {
        let breeders: HashMap<String, GeoPoint> = self
            .documents
            .find(&DocumentFilter::collection(Collection::Breeders).with_geo())
            .await?
            .into_iter()
            .filter_map(|b| b.geo.map(|point| (b.id, point)))
            .collect();

        let mut filter = DocumentFilter::collection(Collection::Dogs);
        if !options.full_resync {
            filter = filter.missing_geo();
        }

        for dog in self.documents.find(&filter).await? {
            let Some(breeder_id) = dog.breeder_id.as_deref() else {
                continue;
            };
            let Some(point) = breeders.get(breeder_id).copied() else {
                tracing::debug!("dog {} has no located breeder", dog.id);
                continue;
            };
            if dog.geo == Some(point) {
                continue;
            }

            self.documents.update(&dog.id, DocumentData::geo(point)).await?;
            self.status.lock().derived += 1;
        }

        Ok(())
    }
}
