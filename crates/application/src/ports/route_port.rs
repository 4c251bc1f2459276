//! Routing backend port

use async_trait::async_trait;
use domain::{Coordinate, RouteOption};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for fetching candidate routes between two points
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoutePort: Send + Sync {
    /// Fetch the route list for a coordinate pair
    async fn fetch_routes(
        &self,
        from: &Coordinate,
        to: &Coordinate,
    ) -> Result<Vec<RouteOption>, ApplicationError>;
}
