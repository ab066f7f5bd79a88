//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the geolocation domain.
//! They have no external dependencies beyond serialization and timestamps.

use crate::domain::value_objects::{Collection, CountryCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized cache identity for a postal code lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoKey {
    /// Uppercase ISO country code
    pub country_code: CountryCode,
    /// Trimmed postal code
    pub postal_code: String,
}

impl GeoKey {
    /// Build a normalized key.
    ///
    /// Returns None when the postal code is empty after trimming; such a
    /// request has no meaningful key and is never cached.
    pub fn new(postal_code: &str, country_code: Option<&str>, default: &CountryCode) -> Option<Self> {
        let postal_code = postal_code.trim();
        if postal_code.is_empty() {
            return None;
        }
        Some(Self {
            country_code: CountryCode::parse_or(country_code, default),
            postal_code: postal_code.to_string(),
        })
    }
}

impl std::fmt::Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.country_code, self.postal_code)
    }
}

/// A resolved coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Result handed to callers: coordinates, or None when no location is known.
pub type GeoResult = Option<GeoPoint>;

/// Where a cache entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSource {
    /// The provider returned coordinates
    Provider,
    /// The provider confirmed there is no match
    Negative,
}

impl GeoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Negative => "negative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "provider" => Some(Self::Provider),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// A persisted lookup result. Immutable once written.
///
/// Coordinates are present exactly when `source` is `Provider`; the only
/// constructors are [`GeoCacheEntry::resolved`] and [`GeoCacheEntry::negative`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCacheEntry {
    key: GeoKey,
    point: Option<GeoPoint>,
    resolved_at: DateTime<Utc>,
}

impl GeoCacheEntry {
    /// Entry for a successful provider lookup.
    pub fn resolved(key: GeoKey, point: GeoPoint) -> Self {
        Self {
            key,
            point: Some(point),
            resolved_at: Utc::now(),
        }
    }

    /// Entry recording that the provider has no match for this key.
    pub fn negative(key: GeoKey) -> Self {
        Self {
            key,
            point: None,
            resolved_at: Utc::now(),
        }
    }

    /// Rebuild an entry read back from storage.
    pub fn restore(key: GeoKey, point: Option<GeoPoint>, resolved_at: DateTime<Utc>) -> Self {
        Self {
            key,
            point,
            resolved_at,
        }
    }

    pub fn key(&self) -> &GeoKey {
        &self.key
    }

    pub fn lat(&self) -> Option<f64> {
        self.point.map(|p| p.lat)
    }

    pub fn lng(&self) -> Option<f64> {
        self.point.map(|p| p.lng)
    }

    pub fn point(&self) -> GeoResult {
        self.point
    }

    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    pub fn source(&self) -> GeoSource {
        match self.point {
            Some(_) => GeoSource::Provider,
            None => GeoSource::Negative,
        }
    }
}

/// A record in the content store that can carry a location.
///
/// Breeders and users are located by postal code; dogs have no address of
/// their own and reference a breeder instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoDocument {
    pub id: String,
    pub collection: Collection,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub breeder_id: Option<String>,
}

impl GeoDocument {
    /// Postal code, if present and non-blank.
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
    }

    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }
}

/// Field payload for creating or updating a document.
///
/// On update, `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub breeder_id: Option<String>,
}

impl DocumentData {
    /// Payload that only sets coordinates.
    pub fn geo(point: GeoPoint) -> Self {
        Self {
            geo: Some(point),
            ..Self::default()
        }
    }

    /// Postal code, if present and non-blank.
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
    }

    /// Build a new document from this payload.
    pub fn into_document(self, id: String, collection: Collection) -> GeoDocument {
        GeoDocument {
            id,
            collection,
            postal_code: self.postal_code,
            country_code: self.country_code,
            geo: self.geo,
            breeder_id: self.breeder_id,
        }
    }

    /// Apply this payload onto an existing document.
    pub fn apply_to(&self, doc: &mut GeoDocument) {
        if let Some(z) = &self.postal_code {
            doc.postal_code = Some(z.clone());
        }
        if let Some(c) = &self.country_code {
            doc.country_code = Some(c.clone());
        }
        if let Some(g) = self.geo {
            doc.geo = Some(g);
        }
        if let Some(b) = &self.breeder_id {
            doc.breeder_id = Some(b.clone());
        }
    }
}

/// Lifecycle state of the bulk synchronization job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Snapshot of the most recent or in-progress synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Records attempted so far (breeders and users)
    pub processed: usize,
    /// Records selected for this run
    pub total: usize,
    /// Records that received coordinates
    pub resolved: usize,
    /// Records whose postal code has no known location
    pub unresolved: usize,
    /// Records skipped because the provider failed
    pub failed: usize,
    /// Dogs that inherited their breeder's coordinates
    pub derived: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl SyncStatus {
    /// Status before any run has happened.
    pub fn idle() -> Self {
        Self {
            state: SyncState::Idle,
            processed: 0,
            total: 0,
            resolved: 0,
            unresolved: 0,
            failed: 0,
            derived: 0,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            last_error: None,
        }
    }

    /// Fresh status for a run starting now.
    pub fn started() -> Self {
        Self {
            state: SyncState::Running,
            started_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SyncState::Running
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::idle()
    }
}
