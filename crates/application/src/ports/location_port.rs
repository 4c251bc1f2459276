//! Device location port

use async_trait::async_trait;
use domain::Coordinate;
#[cfg(test)]
use mockall::automock;

/// Port for the current device position
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LocationPort: Send + Sync {
    /// Best known position. Never fails: implementations return a fixed
    /// fallback when no reading is available.
    async fn current_location(&self) -> Coordinate;
}
