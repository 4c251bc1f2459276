//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod geocoding_port;
mod location_port;
mod route_cache_port;
mod route_port;

#[cfg(test)]
pub use geocoding_port::MockGeocodingPort;
pub use geocoding_port::GeocodingPort;
#[cfg(test)]
pub use location_port::MockLocationPort;
pub use location_port::LocationPort;
#[cfg(test)]
pub use route_cache_port::MockRouteCachePort;
pub use route_cache_port::RouteCachePort;
#[cfg(test)]
pub use route_port::MockRoutePort;
pub use route_port::RoutePort;
