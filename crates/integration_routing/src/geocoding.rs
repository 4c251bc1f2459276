//! 2GIS geocoding client
//!
//! Converts free-form address strings to places, and coordinates back to
//! addresses, using the 2GIS catalog API (`items/geocode`).
//!
//! Forward lookups are cached in memory to spare the API quota while the
//! user keeps typing the same query.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::models::GeocodedPlace;

const RESPONSE_FIELDS: &str = "items.point,items.address_name,items.full_name";

/// Configuration for the 2GIS geocoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoGisConfig {
    /// Base URL of the catalog API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// API key sent as the `key` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache TTL in minutes (0 to disable)
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
}

fn default_geocoding_base_url() -> String {
    "https://catalog.api.2gis.com/3.0".to_string()
}

const fn default_geocoding_timeout_secs() -> u64 {
    30
}

const fn default_cache_ttl_minutes() -> u64 {
    10
}

impl Default for TwoGisConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            api_key: String::new(),
            timeout_secs: default_geocoding_timeout_secs(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl TwoGisConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            cache_ttl_minutes: 0,
            ..Default::default()
        }
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_minutes > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.base_url).map_err(|e| format!("base_url is not a valid URL: {e}"))?;

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Errors that can occur during geocoding
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// Connection to geocoding service failed
    #[error("Geocoding connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to geocoding service failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse geocoding response
    #[error("Geocoding parse error: {0}")]
    ParseError(String),

    /// API key missing or rejected
    #[error("Geocoding API key rejected")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("Geocoding rate limit exceeded")]
    RateLimitExceeded,

    /// Request timeout
    #[error("Geocoding request timed out")]
    Timeout,
}

impl GeocodingError {
    /// Returns true if a later attempt could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RateLimitExceeded | Self::Timeout
        )
    }
}

/// Trait for geocoding clients
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Places matching a free-form address, best match first
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodedPlace>, GeocodingError>;

    /// Places at the given coordinates, best match first
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<GeocodedPlace>, GeocodingError>;
}

/// 2GIS catalog API client with result caching
#[derive(Debug)]
pub struct TwoGisGeocodingClient {
    client: Client,
    config: TwoGisConfig,
    cache: Option<Cache<String, Vec<GeocodedPlace>>>,
}

impl TwoGisGeocodingClient {
    /// Create a new 2GIS geocoding client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &TwoGisConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tripplanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        let cache = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(config.cache_ttl_minutes * 60))
                .build()
        });

        Ok(Self {
            client,
            config: config.clone(),
            cache,
        })
    }

    fn geocode_url(&self) -> String {
        format!("{}/items/geocode", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch(&self, params: &[(&str, String)]) -> Result<Vec<GeocodedPlace>, GeocodingError> {
        let response = self
            .client
            .get(self.geocode_url())
            .query(params)
            .query(&[("fields", RESPONSE_FIELDS), ("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(GeocodingError::RateLimitExceeded),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeocodingError::Unauthorized);
            },
            s if !s.is_success() => {
                return Err(GeocodingError::RequestFailed(format!("HTTP {status}")));
            },
            _ => {},
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        parse_geocode_response(&body)
    }
}

#[async_trait]
impl GeocodingClient for TwoGisGeocodingClient {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodedPlace>, GeocodingError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = address.to_lowercase();
        if let Some(cache) = &self.cache {
            if let Some(places) = cache.get(&cache_key).await {
                debug!(%address, "Geocoding cache hit");
                return Ok(places);
            }
        }

        debug!(%address, "Geocoding address");
        let places = self.fetch(&[("q", address.to_string())]).await?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, places.clone()).await;
        }
        debug!(%address, count = places.len(), "Geocoded address");
        Ok(places)
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<GeocodedPlace>, GeocodingError> {
        debug!(%latitude, %longitude, "Reverse geocoding");
        self.fetch(&[("lat", latitude.to_string()), ("lon", longitude.to_string())])
            .await
    }
}

/// Keep items that carry a point; absent names become empty strings
fn parse_geocode_response(body: &str) -> Result<Vec<GeocodedPlace>, GeocodingError> {
    let raw: RawGeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

    let items = raw.result.and_then(|r| r.items).unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let point = item.point?;
            Some(GeocodedPlace {
                address_name: item.address_name.unwrap_or_default(),
                full_name: item.full_name.unwrap_or_default(),
                latitude: point.lat,
                longitude: point.lon,
            })
        })
        .collect())
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
struct RawGeocodeResponse {
    result: Option<RawGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct RawGeocodeResult {
    items: Option<Vec<RawGeocodeItem>>,
}

#[derive(Debug, Deserialize)]
struct RawGeocodeItem {
    address_name: Option<String>,
    full_name: Option<String>,
    point: Option<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TwoGisConfig::default();
        assert_eq!(config.base_url, "https://catalog.api.2gis.com/3.0");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.caching_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_for_testing() {
        let config = TwoGisConfig::for_testing();
        assert!(!config.caching_enabled());
        assert_eq!(config.api_key, "test-key");
    }

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "result": {
                "items": [
                    {
                        "address_name": "Tverskaya, 7",
                        "full_name": "Moscow, Tverskaya, 7",
                        "point": { "lat": 55.7601, "lon": 37.6095 }
                    },
                    {
                        "address_name": "Tverskaya, 9",
                        "full_name": "Moscow, Tverskaya, 9",
                        "point": { "lat": 55.7612, "lon": 37.6083 }
                    }
                ]
            }
        }"#;

        let places = parse_geocode_response(json).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].address_name, "Tverskaya, 7");
        assert_eq!(places[0].full_name, "Moscow, Tverskaya, 7");
        assert!((places[1].latitude - 55.7612).abs() < 1e-9);
    }

    #[test]
    fn test_items_without_point_are_dropped() {
        let json = r#"{
            "result": {
                "items": [
                    { "address_name": "Somewhere", "full_name": "Nowhere" },
                    { "point": { "lat": 43.6, "lon": 39.7 } }
                ]
            }
        }"#;

        let places = parse_geocode_response(json).unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].address_name, "");
        assert_eq!(places[0].full_name, "");
    }

    #[test]
    fn test_missing_result_or_items_is_empty() {
        assert!(parse_geocode_response("{}").unwrap().is_empty());
        assert!(parse_geocode_response(r#"{"result": {}}"#).unwrap().is_empty());
        assert!(
            parse_geocode_response(r#"{"meta": {"code": 404}, "result": null}"#)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_geocode_response("<html>"),
            Err(GeocodingError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_classification() {
        assert!(GeocodingError::Timeout.is_retryable());
        assert!(GeocodingError::RateLimitExceeded.is_retryable());
        assert!(!GeocodingError::Unauthorized.is_retryable());
        assert!(GeocodingError::Timeout.to_string().contains("timed out"));
    }
}
