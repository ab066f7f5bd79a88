//! SQLite Document Store
//!
//! Implements DocumentStore over a `documents` table holding breeders,
//! users and dogs with their location fields.

use crate::domain::entities::{DocumentData, GeoDocument, GeoPoint};
use crate::domain::errors::StoreError;
use crate::domain::ports::{DocumentFilter, DocumentStore};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id           TEXT PRIMARY KEY,
    collection   TEXT NOT NULL,
    postal_code  TEXT,
    country_code TEXT,
    lat          REAL,
    lng          REAL,
    breeder_id   TEXT
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection);
";

const SELECT_COLUMNS: &str =
    "SELECT id, collection, postal_code, country_code, lat, lng, breeder_id FROM documents";

/// SQLite-backed document store.
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the store in a database file.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Create a store in a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a document with a known id, replacing any previous version.
    ///
    /// Used to import records from the content store.
    pub async fn upsert(&self, doc: GeoDocument) -> Result<(), StoreError> {
        self.with_conn(move |conn| Self::write_document(conn, &doc, true))
            .await
    }

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

    fn write_document(conn: &Connection, doc: &GeoDocument, replace: bool) -> Result<(), StoreError> {
        let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
        conn.execute(
            &format!(
                "{} INTO documents (id, collection, postal_code, country_code, lat, lng, breeder_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                verb
            ),
            params![
                doc.id,
                doc.collection.as_str(),
                doc.postal_code,
                doc.country_code,
                doc.geo.map(|g| g.lat),
                doc.geo.map(|g| g.lng),
                doc.breeder_id,
            ],
        )?;
        Ok(())
    }

    fn load_by_id(conn: &Connection, id: &str) -> Result<Option<GeoDocument>, StoreError> {
        let doc = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                |row| Self::row_to_document(row),
            )
            .optional()?;
        Ok(doc)
    }

    /// Convert a SQLite row to a document.
    fn row_to_document(row: &Row) -> rusqlite::Result<GeoDocument> {
        let collection: String = row.get(1)?;
        let collection = Collection::from_str(&collection).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown collection {:?}", collection).into(),
            )
        })?;

        let lat: Option<f64> = row.get(4)?;
        let lng: Option<f64> = row.get(5)?;

        Ok(GeoDocument {
            id: row.get(0)?,
            collection,
            postal_code: row.get(2)?,
            country_code: row.get(3)?,
            geo: lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
            breeder_id: row.get(6)?,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<GeoDocument>, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let docs = match (&filter.id, filter.collection) {
                (Some(id), _) => Self::load_by_id(conn, id)?.into_iter().collect(),
                (None, Some(c)) => {
                    let mut stmt = conn.prepare(&format!(
                        "{} WHERE collection = ?1 ORDER BY id",
                        SELECT_COLUMNS
                    ))?;
                    let rows = stmt.query_map(params![c.as_str()], |row| Self::row_to_document(row))?;
                    let docs = rows.collect::<Result<Vec<_>, _>>()?;
                    docs
                }
                (None, None) => {
                    let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
                    let rows = stmt.query_map([], |row| Self::row_to_document(row))?;
                    let docs = rows.collect::<Result<Vec<_>, _>>()?;
                    docs
                }
            };

            Ok(docs.into_iter().filter(|d| filter.matches(d)).collect())
        })
        .await
    }

    async fn create(
        &self,
        collection: Collection,
        data: DocumentData,
    ) -> Result<GeoDocument, StoreError> {
        let doc = data.into_document(uuid::Uuid::new_v4().to_string(), collection);
        self.with_conn(move |conn| {
            Self::write_document(conn, &doc, false)?;
            Ok(doc)
        })
        .await
    }

    async fn update(&self, id: &str, data: DocumentData) -> Result<GeoDocument, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let mut doc = Self::load_by_id(conn, &id)?.ok_or(StoreError::NotFound(id))?;
            data.apply_to(&mut doc);
            Self::write_document(conn, &doc, true)?;
            Ok(doc)
        })
        .await
    }
}
