//! Geolocation API Server
//!
//! HTTP API exposing postal code lookups, the bulk sync job and document
//! writes that pass through the enrichment hook.

use crate::application::{GeolocationService, GeolocationSyncJob, SyncOptions};
use crate::domain::entities::{DocumentData, SyncStatus};
use crate::domain::errors::{StoreError, SyncError};
use crate::domain::ports::{DocumentFilter, DocumentStore, GeoCacheStore};
use crate::domain::value_objects::Collection;
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Query string of the lookup endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationQuery {
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default, rename = "countryCode")]
    pub country_code: Option<String>,
}

/// Query string of the sync trigger endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerQuery {
    #[serde(default)]
    pub full: bool,
}

/// Sync trigger response.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub started: bool,
    pub message: String,
    pub status: SyncStatus,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_locations: Option<usize>,
    pub sync: SyncStatus,
}

/// Shared state for the API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub geolocation: Arc<GeolocationService>,
    pub sync: Arc<GeolocationSyncJob>,
    /// Document store with the enrichment hook installed
    pub documents: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn GeoCacheStore>,
    /// Options used for triggered runs; `full_resync` is set per request
    pub sync_options: SyncOptions,
}

/// API Server for geolocation lookups and sync control.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Build the router with all routes and the trace layer.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the API server until shutdown is signalled.
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let app = self.router();

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("geolocation API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("geolocation API stopped");
        Ok(())
    }
}

/// Router over the given state.
///
/// Cross-origin callers may only read; writes and sync control are
/// same-origin.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health_handler))
        // Read-path lookup
        .route("/api/v1/geolocation", get(geolocation_handler))
        // Bulk sync
        .route("/api/v1/geolocation-sync/trigger", post(trigger_sync_handler))
        .route("/api/v1/geolocation-sync/status", get(sync_status_handler))
        // Write path
        .route("/api/v1/documents/:collection", post(create_document_handler))
        .route("/api/v1/documents/:collection/:id", put(update_document_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into()
        })),
    )
        .into_response()
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let cached_locations = match state.cache.count().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!("health: failed to count cache entries: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_locations,
        sync: state.sync.status(),
    })
}

async fn geolocation_handler(
    State(state): State<ApiState>,
    Query(query): Query<GeolocationQuery>,
) -> Response {
    let Some(zip) = query.zip.as_deref().filter(|z| !z.trim().is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "zip is required");
    };

    match state
        .geolocation
        .resolve(zip, query.country_code.as_deref())
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_body(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

async fn trigger_sync_handler(
    State(state): State<ApiState>,
    Query(query): Query<TriggerQuery>,
) -> Response {
    let options = SyncOptions {
        full_resync: query.full,
        ..state.sync_options.clone()
    };

    match state.sync.start(options) {
        Ok(status) => {
            tracing::info!("geolocation sync triggered (full={})", query.full);
            (
                StatusCode::ACCEPTED,
                Json(TriggerResponse {
                    started: true,
                    message: "geolocation sync started".to_string(),
                    status,
                }),
            )
                .into_response()
        }
        Err(SyncError::Busy) => (
            StatusCode::CONFLICT,
            Json(TriggerResponse {
                started: false,
                message: SyncError::Busy.to_string(),
                status: state.sync.status(),
            }),
        )
            .into_response(),
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn sync_status_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.sync.status())
}

async fn create_document_handler(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    Json(data): Json<DocumentData>,
) -> Response {
    let Some(collection) = Collection::from_str(&collection) else {
        return error_body(StatusCode::NOT_FOUND, format!("unknown collection {}", collection));
    };

    match state.documents.create(collection, data).await {
        Ok(doc) => (StatusCode::CREATED, Json(doc)).into_response(),
        Err(e) => {
            tracing::error!("failed to create {} document: {}", collection, e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn update_document_handler(
    State(state): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    Json(data): Json<DocumentData>,
) -> Response {
    let Some(collection) = Collection::from_str(&collection) else {
        return error_body(StatusCode::NOT_FOUND, format!("unknown collection {}", collection));
    };

    // Ids are global; the path must name the collection the document lives in.
    let filter = DocumentFilter {
        collection: Some(collection),
        ..DocumentFilter::id(&id)
    };
    match state.documents.find(&filter).await {
        Ok(found) if found.is_empty() => {
            return error_body(StatusCode::NOT_FOUND, "document not found");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("failed to load document {}: {}", id, e);
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    }

    match state.documents.update(&id, data).await {
        Ok(doc) => Json(doc).into_response(),
        Err(StoreError::NotFound(_)) => error_body(StatusCode::NOT_FOUND, "document not found"),
        Err(e) => {
            tracing::error!("failed to update document {}: {}", id, e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
