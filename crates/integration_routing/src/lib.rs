//! Remote API clients for the trip planner
//!
//! Provides route search against the trip-planning backend and address
//! geocoding via the [2GIS catalog API](https://docs.2gis.com/en/api/search/geocoder/overview).
//!
//! # Architecture
//!
//! [`RouteClient`] defines the interface for route search, implemented by
//! [`HttpRouteClient`]. [`GeocodingClient`] handles forward and reverse
//! geocoding via [`TwoGisGeocodingClient`]. Both return plain models from
//! [`models`]; conversion into domain types happens in the adapters.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_routing::{HttpRouteClient, RouteClient, RoutingConfig};
//!
//! let client = HttpRouteClient::new(&RoutingConfig::default())?;
//!
//! let routes = client.search_routes(
//!     55.751, 37.618, // Moscow
//!     43.585, 39.723, // Sochi
//! ).await?;
//! ```

mod client;
mod config;
mod error;
mod geocoding;
pub mod models;

pub use client::{HttpRouteClient, RouteClient};
pub use config::RoutingConfig;
pub use error::RoutingError;
pub use geocoding::{GeocodingClient, GeocodingError, TwoGisConfig, TwoGisGeocodingClient};
pub use models::{GeocodedPlace, RoutePlan, RoutePoint};
