//! Route adapter - Implements RoutePort using integration_routing

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::RoutePort;
use async_trait::async_trait;
use domain::{Coordinate, RouteOption};
use integration_routing::{HttpRouteClient, RouteClient, RoutePlan, RoutingConfig, RoutingError};
use tracing::{debug, instrument, warn};

/// Adapter for the trip-planning backend
pub struct RouteAdapter {
    client: Arc<dyn RouteClient>,
}

impl std::fmt::Debug for RouteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteAdapter").finish_non_exhaustive()
    }
}

impl RouteAdapter {
    /// Wrap an existing route client
    #[must_use]
    pub fn new(client: Arc<dyn RouteClient>) -> Self {
        Self { client }
    }

    /// Create an adapter backed by the HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// fails to initialize.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, ApplicationError> {
        let client = HttpRouteClient::new(config).map_err(|e| match e {
            RoutingError::ConfigurationError(msg) => ApplicationError::Configuration(msg),
            other => ApplicationError::Internal(other.to_string()),
        })?;
        Ok(Self::new(Arc::new(client)))
    }

    fn map_error(error: RoutingError) -> ApplicationError {
        match error {
            RoutingError::RateLimitExceeded { .. } => ApplicationError::RateLimited,
            RoutingError::ConfigurationError(msg) => ApplicationError::Configuration(msg),
            other => ApplicationError::ExternalService(format!("Route search failed: {other}")),
        }
    }

    /// Convert a backend plan, dropping path points outside the valid range
    fn to_route_option(plan: RoutePlan) -> RouteOption {
        if !plan.has_path() {
            debug!(route_id = %plan.id, "Route has no path");
        }
        let total = plan.points.len();
        let points: Vec<Coordinate> = plan
            .points
            .into_iter()
            .filter_map(|p| Coordinate::new(p.latitude, p.longitude).ok())
            .collect();
        if points.len() < total {
            warn!(
                route_id = %plan.id,
                dropped = total - points.len(),
                "Dropped invalid path points"
            );
        }

        RouteOption {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            duration_secs: plan.duration_secs,
            distance: plan.distance,
            price: plan.price,
            transport_type: plan.transport_type,
            points,
        }
    }
}

#[async_trait]
impl RoutePort for RouteAdapter {
    #[instrument(skip(self), fields(from = %from, to = %to))]
    async fn fetch_routes(
        &self,
        from: &Coordinate,
        to: &Coordinate,
    ) -> Result<Vec<RouteOption>, ApplicationError> {
        let plans = self
            .client
            .search_routes(
                from.latitude(),
                from.longitude(),
                to.latitude(),
                to.longitude(),
            )
            .await
            .map_err(Self::map_error)?;

        let routes: Vec<RouteOption> = plans.into_iter().map(Self::to_route_option).collect();
        debug!(count = routes.len(), "Fetched routes");
        Ok(routes)
    }
}
