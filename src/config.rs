use crate::adapters::outbound::NominatimConfig;
use crate::application::SyncOptions;
use crate::domain::value_objects::CountryCode;
use serde::Deserialize;
use std::time::Duration;

/// Which geolocation cache adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Sqlite,
    Memory,
}

impl CacheBackend {
    fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" | "dashmap" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Service settings
    pub listen_addr: String,
    pub db_path: String,
    pub cache_backend: CacheBackend,
    pub default_country: String,
    pub debug: bool,

    // Sync settings
    pub sync_concurrency: usize,
    pub sync_record_delay_ms: u64,

    // Nominatim settings
    pub nominatim_base_url: String,
    pub nominatim_user_agent: String,
    pub nominatim_email: Option<String>,
    pub nominatim_delay_ms: u64,
    pub nominatim_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let nominatim = NominatimConfig::default();
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            db_path: "geo.db".to_string(),
            cache_backend: CacheBackend::Sqlite,
            default_country: "DE".to_string(),
            debug: false,
            sync_concurrency: 1,
            sync_record_delay_ms: 100,
            nominatim_base_url: nominatim.base_url,
            nominatim_user_agent: nominatim.user_agent,
            nominatim_email: None,
            nominatim_delay_ms: 1000,
            nominatim_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Country used when a request carries none.
    pub fn default_country(&self) -> CountryCode {
        CountryCode::parse(&self.default_country).unwrap_or_default()
    }

    pub fn nominatim(&self) -> NominatimConfig {
        NominatimConfig {
            base_url: self.nominatim_base_url.clone(),
            user_agent: self.nominatim_user_agent.clone(),
            email: self.nominatim_email.clone(),
            min_interval: Duration::from_millis(self.nominatim_delay_ms),
            timeout: Duration::from_secs(self.nominatim_timeout_secs),
        }
    }

    pub fn sync_options(&self, full_resync: bool) -> SyncOptions {
        SyncOptions {
            full_resync,
            concurrency: self.sync_concurrency.max(1),
            record_delay: Duration::from_millis(self.sync_record_delay_ms),
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from a variable lookup.
///
/// Unparseable numbers fall back to their defaults; an unknown cache
/// backend is an error.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("HZD_GEO_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let db_path = var("HZD_GEO_DB_PATH").unwrap_or(defaults.db_path);

    let cache_backend = match var("HZD_GEO_CACHE_BACKEND") {
        Some(v) => CacheBackend::from_str(&v)
            .ok_or_else(|| anyhow::anyhow!("unknown HZD_GEO_CACHE_BACKEND: {}", v))?,
        None => defaults.cache_backend,
    };

    let default_country = var("HZD_GEO_DEFAULT_COUNTRY")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.default_country);

    let debug = var("DEBUG").is_some();

    let sync_concurrency = var("HZD_GEO_SYNC_CONCURRENCY")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.sync_concurrency);

    let sync_record_delay_ms = var("HZD_GEO_SYNC_RECORD_DELAY_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.sync_record_delay_ms);

    // Nominatim settings
    let nominatim_base_url = var("NOMINATIM_BASE_URL").unwrap_or(defaults.nominatim_base_url);

    let nominatim_user_agent =
        var("NOMINATIM_USER_AGENT").unwrap_or(defaults.nominatim_user_agent);

    let nominatim_email = var("NOMINATIM_EMAIL").filter(|v| !v.trim().is_empty());

    let nominatim_delay_ms = var("NOMINATIM_DELAY_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.nominatim_delay_ms);

    let nominatim_timeout_secs = var("NOMINATIM_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.nominatim_timeout_secs);

    Ok(Config {
        listen_addr,
        db_path,
        cache_backend,
        default_country,
        debug,
        sync_concurrency,
        sync_record_delay_ms,
        nominatim_base_url,
        nominatim_user_agent,
        nominatim_email,
        nominatim_delay_ms,
        nominatim_timeout_secs,
    })
}
