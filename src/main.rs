//! hzd-geo - Postal code geolocation service with hexagonal architecture
//!
//! This is the composition root that wires together all the components.

use clap::{Parser, Subcommand};
use hzd_geo::adapters::inbound::{ApiServer, ApiState};
use hzd_geo::adapters::outbound::{
    DashMapDocumentStore, DashMapGeoCacheStore, NominatimGeoProvider, SqliteDocumentStore,
    SqliteGeoCacheStore,
};
use hzd_geo::config::{load_config, CacheBackend, Config};
use hzd_geo::infrastructure::{shutdown_signal, ShutdownController};
use hzd_geo::{
    DocumentStore, GeoCacheStore, GeoEnrichmentInterceptor, GeolocationService,
    GeolocationSyncJob, InterceptedDocumentStore,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hzd-geo")]
#[command(version)]
#[command(about = "Postal code geolocation for breeder and member records")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Run one geolocation sync and print the final status as JSON
    Sync {
        /// Re-resolve records that already have coordinates
        #[arg(long)]
        full: bool,
    },
}

/// Open the cache and document store selected by the configuration.
fn build_stores(cfg: &Config) -> anyhow::Result<(Arc<dyn GeoCacheStore>, Arc<dyn DocumentStore>)> {
    match cfg.cache_backend {
        CacheBackend::Sqlite => {
            let cache = SqliteGeoCacheStore::open(&cfg.db_path)?;
            let documents = SqliteDocumentStore::open(&cfg.db_path)?;
            tracing::info!("SQLite stores opened at {}", cfg.db_path);
            Ok((Arc::new(cache), Arc::new(documents)))
        }
        CacheBackend::Memory => {
            tracing::warn!("using in-memory stores; nothing survives a restart");
            Ok((
                Arc::new(DashMapGeoCacheStore::new()),
                Arc::new(DashMapDocumentStore::new()),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    tracing::info!(
        "starting hzd-geo v{} listen={} default_country={}",
        env!("CARGO_PKG_VERSION"),
        cfg.listen_addr,
        cfg.default_country()
    );

    // ===== COMPOSITION ROOT =====
    // Wire up all adapters and services

    // 1. Create outbound adapters
    let (cache, raw_documents) = build_stores(&cfg)?;
    let provider = Arc::new(NominatimGeoProvider::new(cfg.nominatim())?);

    // 2. Create application services
    let geolocation = Arc::new(GeolocationService::new(
        provider,
        cache.clone(),
        cfg.default_country(),
    ));

    let documents: Arc<dyn DocumentStore> = Arc::new(
        InterceptedDocumentStore::new(raw_documents)
            .with_interceptor(Arc::new(GeoEnrichmentInterceptor::new(geolocation.clone()))),
    );

    let sync = Arc::new(GeolocationSyncJob::new(
        geolocation.clone(),
        documents.clone(),
    ));

    // 3. Run the selected inbound adapter
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let shutdown = ShutdownController::new();
            tokio::spawn(shutdown_signal(shutdown.clone()));

            let server = ApiServer::new(
                cfg.listen_addr.clone(),
                ApiState {
                    geolocation,
                    sync: sync.clone(),
                    documents,
                    cache,
                    sync_options: cfg.sync_options(false),
                },
            );
            server.run(shutdown).await?;

            let status = sync.status();
            if status.is_running() {
                tracing::warn!(
                    "shutting down with geolocation sync in progress ({}/{} records)",
                    status.processed,
                    status.total
                );
            }
            Ok(())
        }
        Command::Sync { full } => {
            let result = sync.run(cfg.sync_options(full)).await;
            println!("{}", serde_json::to_string_pretty(&sync.status())?);
            result?;
            Ok(())
        }
    }
}
