//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: 2GIS geocoding, the
//! routing backend, device location and the SQLite route cache. Also owns
//! configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, DatabaseConfig, LocationConfig, LocationSourceConfig};
pub use persistence::{ConnectionPool, DatabaseError, SqliteRouteCache, create_pool};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
