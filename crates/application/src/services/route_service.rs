//! Route fetching with cache fallback
//!
//! Prefers a fresh result from the routing backend and persists it. When the
//! backend fails, the whole cache is returned instead. Fresh and cached
//! routes are never mixed.

use std::fmt;
use std::sync::Arc;

use domain::{Coordinate, DomainError, RouteOption, RouteSource};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{RouteCachePort, RoutePort};

/// Result of one fetch-with-fallback run
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFetch {
    /// Routes to show
    pub routes: Vec<RouteOption>,
    /// Whether `routes` is fresh or read from the cache
    pub source: RouteSource,
    /// Backend error that triggered the fallback
    pub fetch_error: Option<String>,
}

impl RouteFetch {
    /// Whether the backend call failed and the cache was used
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, RouteSource::Cached)
    }
}

/// Route service backed by a routing port and a route cache
#[derive(Clone)]
pub struct RouteService {
    routes: Arc<dyn RoutePort>,
    cache: Arc<dyn RouteCachePort>,
}

impl fmt::Debug for RouteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteService").finish_non_exhaustive()
    }
}

impl RouteService {
    /// Create a new route service
    #[must_use]
    pub fn new(routes: Arc<dyn RoutePort>, cache: Arc<dyn RouteCachePort>) -> Self {
        Self { routes, cache }
    }

    /// Fetch routes, falling back to the cached set on failure
    ///
    /// Never fails: the worst outcome is an empty cached list.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn fetch_with_fallback(&self, from: &Coordinate, to: &Coordinate) -> RouteFetch {
        match self.routes.fetch_routes(from, to).await {
            Ok(routes) => {
                if let Err(e) = self.cache.upsert_all(&routes).await {
                    warn!(error = %e, "Failed to cache fetched routes");
                }
                debug!(count = routes.len(), "Fetched fresh routes");
                RouteFetch {
                    routes,
                    source: RouteSource::Fresh,
                    fetch_error: None,
                }
            },
            Err(fetch_err) => {
                warn!(error = %fetch_err, "Route fetch failed, falling back to cache");
                let routes = match self.cache.list_all().await {
                    Ok(routes) => routes,
                    Err(e) => {
                        warn!(error = %e, "Failed to read route cache");
                        Vec::new()
                    },
                };
                info!(count = routes.len(), "Serving cached routes");
                RouteFetch {
                    routes,
                    source: RouteSource::Cached,
                    fetch_error: Some(fetch_err.to_string()),
                }
            },
        }
    }

    /// Every cached route
    pub async fn saved_routes(&self) -> Result<Vec<RouteOption>, ApplicationError> {
        self.cache.list_all().await
    }

    /// A single cached route
    pub async fn saved_route(&self, id: &str) -> Result<RouteOption, ApplicationError> {
        self.cache
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Route", id).into())
    }

    /// Remove a route from the cache
    pub async fn forget_route(&self, id: &str) -> Result<bool, ApplicationError> {
        self.cache.delete(id).await
    }

    /// Empty the cache
    pub async fn forget_all(&self) -> Result<usize, ApplicationError> {
        self.cache.clear().await
    }
}
