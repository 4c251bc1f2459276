//! Composition root: wires adapters into the planner

use std::sync::Arc;

use anyhow::Context;
use application::{RoutePlanner, RouteService};
use infrastructure::{
    AppConfig, GeocodingAdapter, LocationProvider, RouteAdapter, SqliteRouteCache, create_pool,
};

/// Services shared by every command
#[derive(Debug)]
pub struct App {
    pub planner: RoutePlanner,
}

impl App {
    /// Build the service graph from configuration
    pub fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database).context("failed to open route cache")?;
        let cache = SqliteRouteCache::new(Arc::new(pool));

        let geocoding = GeocodingAdapter::from_config(&config.geocoding)?;
        let backend = RouteAdapter::from_config(&config.routing)?;
        let location = LocationProvider::from_config(&config.location)
            .map_err(|e| anyhow::anyhow!(e))?;

        let routes = RouteService::new(Arc::new(backend), Arc::new(cache));
        let planner = RoutePlanner::new(
            Arc::new(geocoding),
            Arc::new(location),
            routes,
            config.planner.clone(),
        );

        Ok(Self { planner })
    }
}
