//! Route cache port
//!
//! Local store of previously fetched routes, keyed by route identifier.

use async_trait::async_trait;
use domain::RouteOption;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the persisted route cache
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteCachePort: Send + Sync {
    /// Insert or replace routes by identifier
    async fn upsert_all(&self, routes: &[RouteOption]) -> Result<(), ApplicationError>;

    /// Look up a single route
    async fn get(&self, id: &str) -> Result<Option<RouteOption>, ApplicationError>;

    /// Every cached route
    async fn list_all(&self) -> Result<Vec<RouteOption>, ApplicationError>;

    /// Delete one route; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool, ApplicationError>;

    /// Delete every route; returns how many were removed
    async fn clear(&self) -> Result<usize, ApplicationError>;
}
