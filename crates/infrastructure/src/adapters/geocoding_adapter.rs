//! Geocoding adapter - Implements GeocodingPort using integration_routing
//!
//! Fails open: any client error is logged and reported as "no candidates",
//! so a flaky geocoder never blocks the planner.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::GeocodingPort;
use async_trait::async_trait;
use domain::{AddressCandidate, Coordinate};
use integration_routing::{
    GeocodedPlace, GeocodingClient, GeocodingError, TwoGisConfig, TwoGisGeocodingClient,
};
use tracing::{debug, instrument, warn};

/// Adapter for address lookup via the 2GIS catalog API
pub struct GeocodingAdapter {
    client: Arc<dyn GeocodingClient>,
}

impl std::fmt::Debug for GeocodingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingAdapter").finish_non_exhaustive()
    }
}

impl GeocodingAdapter {
    /// Wrap an existing geocoding client
    #[must_use]
    pub fn new(client: Arc<dyn GeocodingClient>) -> Self {
        Self { client }
    }

    /// Create an adapter backed by the 2GIS client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn from_config(config: &TwoGisConfig) -> Result<Self, ApplicationError> {
        let client = TwoGisGeocodingClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Convert places to candidates, dropping out-of-range coordinates
    fn to_candidates(places: Vec<GeocodedPlace>) -> Vec<AddressCandidate> {
        places
            .into_iter()
            .filter_map(|place| match Coordinate::new(place.latitude, place.longitude) {
                Ok(coordinate) => Some(AddressCandidate::new(
                    place.address_name,
                    place.full_name,
                    coordinate,
                )),
                Err(_) => {
                    warn!(
                        latitude = place.latitude,
                        longitude = place.longitude,
                        "Dropping geocoding result with invalid coordinates"
                    );
                    None
                },
            })
            .collect()
    }

    fn fail_open(
        result: Result<Vec<GeocodedPlace>, GeocodingError>,
        what: &str,
    ) -> Vec<AddressCandidate> {
        match result {
            Ok(places) => {
                let candidates = Self::to_candidates(places);
                debug!(count = candidates.len(), what, "Geocoding succeeded");
                candidates
            },
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), what, "Geocoding failed");
                Vec::new()
            },
        }
    }
}

#[async_trait]
impl GeocodingPort for GeocodingAdapter {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, ApplicationError> {
        Ok(Self::fail_open(self.client.geocode(query).await, "geocode"))
    }

    #[instrument(skip(self), fields(coordinate = %coordinate))]
    async fn reverse_geocode(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<AddressCandidate>, ApplicationError> {
        let result = self
            .client
            .reverse_geocode(coordinate.latitude(), coordinate.longitude())
            .await;
        Ok(Self::fail_open(result, "reverse_geocode"))
    }
}
