//! Geocoding service port
//!
//! Text → coordinate and coordinate → text lookups.

use async_trait::async_trait;
use domain::{AddressCandidate, Coordinate};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for address geocoding
///
/// Production adapters fail open and return an empty list instead of an
/// error; callers still handle `Err` for adapters that do not.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Candidates matching a free-text query, best match first
    async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, ApplicationError>;

    /// Candidates describing the given point, best match first
    async fn reverse_geocode(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<AddressCandidate>, ApplicationError>;
}
