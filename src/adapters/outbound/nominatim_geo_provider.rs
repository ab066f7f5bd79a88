//! Nominatim Geo Provider
//!
//! Implements GeoProvider using the OpenStreetMap Nominatim search API.
//! See <https://nominatim.org/release-docs/latest/api/Usage-Policy/> for the
//! usage policy the defaults below follow.

use crate::domain::entities::{GeoKey, GeoPoint, GeoResult};
use crate::domain::errors::ProviderError;
use crate::domain::ports::GeoProvider;
use crate::infrastructure::{RequestThrottle, ThrottleConfig};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

/// Nominatim client configuration.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Search endpoint
    pub base_url: String,
    /// Descriptive User-Agent with contact info (required by Nominatim)
    pub user_agent: String,
    /// Optional contact email sent with each request
    pub email: Option<String>,
    /// Minimum time between two requests
    pub min_interval: Duration,
    /// Transport timeout per request
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "HZD-Backend/1.0 (contact@hzd-hovawarte.de)".to_string(),
            email: None,
            min_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }
}

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Nominatim-backed geo provider.
///
/// Requests are serialized through a [`RequestThrottle`]; a timeout or
/// non-2xx response is reported as a [`ProviderError`], never as "not found".
pub struct NominatimGeoProvider {
    client: reqwest::Client,
    config: NominatimConfig,
    throttle: RequestThrottle,
}

impl NominatimGeoProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: NominatimConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        let throttle = RequestThrottle::new(ThrottleConfig {
            min_interval: config.min_interval,
        });

        Ok(Self {
            client,
            config,
            throttle,
        })
    }

    /// Query string for a lookup.
    fn query_params(&self, key: &GeoKey) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("postalcode", key.postal_code.clone()),
            ("countrycodes", key.country_code.as_str().to_lowercase()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("addressdetails", "0".to_string()),
        ];
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        params
    }

    /// Interpret the search hits. An empty list is a confirmed negative.
    fn parse_places(places: &[NominatimPlace]) -> Result<GeoResult, ProviderError> {
        let Some(place) = places.first() else {
            return Ok(None);
        };

        let lat = place.lat.trim().parse::<f64>();
        let lng = place.lon.trim().parse::<f64>();

        match (lat, lng) {
            (Ok(lat), Ok(lng)) if lat.is_finite() && lng.is_finite() => {
                Ok(Some(GeoPoint::new(lat, lng)))
            }
            _ => Err(ProviderError::InvalidResponse(format!(
                "invalid coordinates lat={:?} lon={:?}",
                place.lat, place.lon
            ))),
        }
    }

    async fn fetch(&self, key: &GeoKey) -> Result<GeoResult, ProviderError> {
        tracing::info!("fetching geolocation for {}", key);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query_params(key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("nominatim returned HTTP {} for {}", status, key);
            return Err(ProviderError::Status(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Self::parse_places(&places)
    }
}

#[async_trait]
impl GeoProvider for NominatimGeoProvider {
    async fn lookup(&self, key: &GeoKey) -> Result<GeoResult, ProviderError> {
        self.throttle.schedule(self.fetch(key)).await
    }
}
