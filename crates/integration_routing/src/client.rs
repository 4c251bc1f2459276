//! Route search client for the trip-planning backend
//!
//! Queries `GET {base}/routes?fromLat=..&fromLng=..&toLat=..&toLng=..` and
//! converts the response into [`RoutePlan`]s.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::RoutingConfig;
use crate::error::RoutingError;
use crate::models::{RoutePlan, RoutePoint};

/// Trait for route search clients
#[async_trait]
pub trait RouteClient: Send + Sync {
    /// Search routes between two coordinate pairs
    async fn search_routes(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    ) -> Result<Vec<RoutePlan>, RoutingError>;
}

/// HTTP client for the trip-planning backend
#[derive(Debug)]
pub struct HttpRouteClient {
    client: Client,
    config: RoutingConfig,
}

impl HttpRouteClient {
    /// Create a new route client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        config
            .validate()
            .map_err(RoutingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tripplanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Parse the raw routes response into typed plans
    fn parse_routes_response(body: &str) -> Result<Vec<RoutePlan>, RoutingError> {
        let raw: RawRoutesResponse =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        Ok(raw.routes.into_iter().map(Self::convert_route).collect())
    }

    fn convert_route(raw: RawRoute) -> RoutePlan {
        RoutePlan {
            id: raw.id,
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            duration_secs: u64::try_from(raw.duration).unwrap_or(0),
            distance: raw.distance,
            price: raw.price.max(0.0),
            transport_type: raw.transport_type,
            points: raw
                .points
                .into_iter()
                .map(|p| RoutePoint {
                    latitude: p.lat,
                    longitude: p.lng,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl RouteClient for HttpRouteClient {
    #[instrument(skip(self), fields(from = %format!("{from_lat},{from_lon}"), to = %format!("{to_lat},{to_lon}")))]
    async fn search_routes(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
    ) -> Result<Vec<RoutePlan>, RoutingError> {
        let url = self.config.endpoint("routes");

        let params = [
            ("fromLat", from_lat.to_string()),
            ("fromLng", from_lon.to_string()),
            ("toLat", to_lat.to_string()),
            ("toLng", to_lon.to_string()),
        ];

        debug!(?url, "Searching routes");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    RoutingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimitExceeded {
                retry_after_secs: response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok()),
            });
        }

        if status.is_server_error() {
            return Err(RoutingError::ServiceUnavailable(format!("HTTP {status}")));
        }

        if !status.is_success() {
            return Err(RoutingError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        let routes = Self::parse_routes_response(&body)?;

        if routes.is_empty() {
            warn!("No routes found");
        }

        debug!(count = routes.len(), "Routes found");
        Ok(routes)
    }
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
struct RawRoutesResponse {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    id: String,
    name: String,
    description: Option<String>,
    duration: i64,
    distance: f64,
    price: f64,
    #[serde(rename = "type")]
    transport_type: String,
    #[serde(default)]
    points: Vec<RawLatLng>,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}
