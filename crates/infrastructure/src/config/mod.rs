//! Application configuration
//!
//! Split into focused sub-modules:
//! - `database`: SQLite route cache settings
//! - `location`: position sources and the fallback coordinate
//!
//! Routing, geocoding and planner sections reuse the config types of the
//! crates that consume them.

mod database;
mod location;

use std::path::Path;

use application::PlannerConfig;
use integration_routing::{RoutingConfig, TwoGisConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use database::DatabaseConfig;
pub use location::{LocationConfig, LocationSourceConfig};

use crate::telemetry::TelemetryConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Environment variable prefix, e.g. `TRIPPLANNER_GEOCODING__API_KEY`
pub const ENV_PREFIX: &str = "TRIPPLANNER";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Route cache database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Trip-planning backend
    #[serde(default)]
    pub routing: RoutingConfig,

    /// 2GIS geocoding
    #[serde(default)]
    pub geocoding: TwoGisConfig,

    /// Device location
    #[serde(default)]
    pub location: LocationConfig,

    /// Planning-session behaviour
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from an explicit file (if given) and environment
    ///
    /// Sources in increasing precedence: built-in defaults, the file
    /// (`config.*` in the working directory when no path is given), then
    /// `TRIPPLANNER_*` environment variables with `__` between nested keys.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, prefixed with its section.
    pub fn validate(&self) -> Result<(), String> {
        self.database.validate()?;
        self.routing
            .validate()
            .map_err(|e| format!("routing: {e}"))?;
        self.geocoding
            .validate()
            .map_err(|e| format!("geocoding: {e}"))?;
        self.location.validate()?;
        self.planner
            .validate()
            .map_err(|e| format!("planner: {e}"))?;

        if self.geocoding.api_key.is_empty() {
            warn!("geocoding.api_key is empty; 2GIS requests will be rejected");
        }

        Ok(())
    }
}
