//! Route and place models returned by the clients

use serde::{Deserialize, Serialize};

/// A point on a route path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// One route option offered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Backend identifier, stable across requests
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Travel time in seconds
    pub duration_secs: u64,
    /// Travel distance as reported by the backend
    pub distance: f64,
    /// Ticket price in roubles
    pub price: f64,
    /// Transport mode tag (e.g. "bus", "train", "plane")
    pub transport_type: String,
    /// Path geometry, possibly empty
    pub points: Vec<RoutePoint>,
}

impl RoutePlan {
    /// Whether the backend supplied any geometry
    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.points.is_empty()
    }
}

/// A geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    /// Short address (street and house), empty when the API omits it
    pub address_name: String,
    /// Full address including the city, empty when the API omits it
    pub full_name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}
