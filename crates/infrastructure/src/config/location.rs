//! Device location configuration.

use domain::Coordinate;
use serde::{Deserialize, Serialize};

use super::default_true;

/// One position source and its last known fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSourceConfig {
    /// Source name used in logs (e.g. "gps", "network")
    pub name: String,

    /// Whether the source is switched on
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Last known latitude, if the source has a fix
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Last known longitude, if the source has a fix
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Accuracy radius of the fix in metres (lower is better)
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

/// Location provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Whether the user allowed location access
    #[serde(default = "default_true")]
    pub permission_granted: bool,

    /// Position sources, in priority order for equal accuracy
    #[serde(default)]
    pub sources: Vec<LocationSourceConfig>,

    /// Latitude used when no fix is available
    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,

    /// Longitude used when no fix is available
    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
}

const fn default_fallback_latitude() -> f64 {
    Coordinate::moscow_center().latitude()
}

const fn default_fallback_longitude() -> f64 {
    Coordinate::moscow_center().longitude()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            permission_granted: true,
            sources: Vec::new(),
            fallback_latitude: default_fallback_latitude(),
            fallback_longitude: default_fallback_longitude(),
        }
    }
}

impl LocationConfig {
    /// The fallback position
    ///
    /// # Errors
    ///
    /// Returns an error if the configured fallback is out of range.
    pub fn fallback(&self) -> Result<Coordinate, String> {
        Coordinate::new(self.fallback_latitude, self.fallback_longitude)
            .map_err(|e| format!("location fallback: {e}"))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.fallback()?;

        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err("location source name must not be empty".to_string());
            }
            if source.latitude.is_some() != source.longitude.is_some() {
                return Err(format!(
                    "location source '{}' needs both latitude and longitude",
                    source.name
                ));
            }
            if let (Some(lat), Some(lon)) = (source.latitude, source.longitude) {
                Coordinate::new(lat, lon)
                    .map_err(|e| format!("location source '{}': {e}", source.name))?;
            }
            if source.accuracy_m.is_some_and(|a| a.is_nan() || a < 0.0) {
                return Err(format!(
                    "location source '{}' has a negative accuracy",
                    source.name
                ));
            }
        }

        Ok(())
    }
}
