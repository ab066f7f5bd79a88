//! SQLite Geo Cache Store
//!
//! Implements GeoCacheStore using SQLite for storage.
//! Key uniqueness is enforced by the table's primary key.

use crate::domain::entities::{GeoCacheEntry, GeoKey, GeoPoint, GeoSource};
use crate::domain::errors::StoreError;
use crate::domain::ports::{GeoCacheStore, InsertOutcome};
use crate::domain::value_objects::CountryCode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS geo_locations (
    country_code TEXT NOT NULL,
    postal_code  TEXT NOT NULL,
    lat          REAL,
    lng          REAL,
    source       TEXT NOT NULL CHECK (source IN ('provider', 'negative')),
    resolved_at  INTEGER NOT NULL,
    PRIMARY KEY (country_code, postal_code),
    CHECK ((lat IS NULL) = (lng IS NULL))
);
";

/// Raw column values of one cache row.
struct CacheRow {
    country_code: String,
    postal_code: String,
    lat: Option<f64>,
    lng: Option<f64>,
    source: String,
    resolved_at_ms: i64,
}

/// SQLite-backed geolocation cache.
///
/// A single connection is shared behind a mutex; every query runs on the
/// blocking thread pool.
pub struct SqliteGeoCacheStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGeoCacheStore {
    /// Open (or create) the cache in a database file.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Create a cache in a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await?
    }

    /// Read the raw columns of a row.
    fn read_row(row: &Row) -> rusqlite::Result<CacheRow> {
        Ok(CacheRow {
            country_code: row.get(0)?,
            postal_code: row.get(1)?,
            lat: row.get(2)?,
            lng: row.get(3)?,
            source: row.get(4)?,
            resolved_at_ms: row.get(5)?,
        })
    }

    /// Convert raw columns to a cache entry, rejecting inconsistent rows.
    fn row_to_entry(row: CacheRow) -> Result<GeoCacheEntry, StoreError> {
        let corrupt = |msg: &str| {
            StoreError::Corrupt(format!(
                "{}-{}: {}",
                row.country_code, row.postal_code, msg
            ))
        };

        let country_code =
            CountryCode::parse(&row.country_code).ok_or_else(|| corrupt("empty country code"))?;
        let source = GeoSource::from_str(&row.source).ok_or_else(|| corrupt("unknown source"))?;
        let resolved_at = DateTime::<Utc>::from_timestamp_millis(row.resolved_at_ms)
            .ok_or_else(|| corrupt("resolved_at out of range"))?;

        let point = match (row.lat, row.lng, source) {
            (Some(lat), Some(lng), GeoSource::Provider) => Some(GeoPoint::new(lat, lng)),
            (None, None, GeoSource::Negative) => None,
            _ => return Err(corrupt("coordinates do not match source")),
        };

        let key = GeoKey {
            country_code,
            postal_code: row.postal_code.clone(),
        };

        Ok(GeoCacheEntry::restore(key, point, resolved_at))
    }
}

#[async_trait]
impl GeoCacheStore for SqliteGeoCacheStore {
    async fn get(&self, key: &GeoKey) -> Result<Option<GeoCacheEntry>, StoreError> {
        let country = key.country_code.as_str().to_string();
        let postal = key.postal_code.clone();

        let row = self
            .with_conn(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT country_code, postal_code, lat, lng, source, resolved_at
                         FROM geo_locations
                         WHERE country_code = ?1 AND postal_code = ?2",
                        params![country, postal],
                        |row| Self::read_row(row),
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        row.map(Self::row_to_entry).transpose()
    }

    async fn insert(&self, entry: GeoCacheEntry) -> Result<InsertOutcome, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO geo_locations
                 (country_code, postal_code, lat, lng, source, resolved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.key().country_code.as_str(),
                    entry.key().postal_code,
                    entry.lat(),
                    entry.lng(),
                    entry.source().as_str(),
                    entry.resolved_at().timestamp_millis(),
                ],
            )?;

            Ok(if changed == 0 {
                InsertOutcome::AlreadyPresent
            } else {
                InsertOutcome::Inserted
            })
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM geo_locations", [], |row| row.get(0))?;
            Ok(n as usize)
        })
        .await
    }
}
