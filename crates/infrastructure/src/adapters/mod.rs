//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod geocoding_adapter;
mod location_adapter;
mod route_adapter;

pub use geocoding_adapter::GeocodingAdapter;
pub use location_adapter::{
    ConfiguredLocationSource, LocationFix, LocationProvider, LocationSource,
};
pub use route_adapter::RouteAdapter;
