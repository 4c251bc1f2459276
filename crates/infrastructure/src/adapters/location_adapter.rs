//! Location adapter - Implements LocationPort over configured position sources
//!
//! Picks the most accurate fix among enabled sources and falls back to a
//! fixed coordinate when permission is denied or nothing has a fix.

use std::sync::Arc;

use application::ports::LocationPort;
use async_trait::async_trait;
use domain::Coordinate;
use tracing::{debug, instrument, warn};

use crate::config::{LocationConfig, LocationSourceConfig};

/// A single position reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Accuracy radius in metres, lower is better
    pub accuracy_m: f64,
}

/// A device position source (GPS, network, ...)
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Whether the source is switched on
    fn is_enabled(&self) -> bool;

    /// Last known fix, if any
    async fn last_known(&self) -> Option<LocationFix>;
}

/// Source backed by a fixed reading from configuration
#[derive(Debug, Clone)]
pub struct ConfiguredLocationSource {
    name: String,
    enabled: bool,
    fix: Option<LocationFix>,
}

impl ConfiguredLocationSource {
    #[must_use]
    pub fn new(name: impl Into<String>, enabled: bool, fix: Option<LocationFix>) -> Self {
        Self {
            name: name.into(),
            enabled,
            fix,
        }
    }

    /// Build from configuration. Out-of-range or partial readings count as
    /// "no fix"; a missing accuracy is treated as worst.
    #[must_use]
    pub fn from_config(config: &LocationSourceConfig) -> Self {
        let fix = match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
                Ok(coordinate) => Some(LocationFix {
                    coordinate,
                    accuracy_m: config.accuracy_m.unwrap_or(f64::INFINITY),
                }),
                Err(e) => {
                    warn!(source = %config.name, error = %e, "Ignoring invalid location fix");
                    None
                },
            },
            _ => None,
        };
        Self::new(config.name.clone(), config.enabled, fix)
    }
}

#[async_trait]
impl LocationSource for ConfiguredLocationSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn last_known(&self) -> Option<LocationFix> {
        self.fix
    }
}

/// Resolves the current position from a set of sources
pub struct LocationProvider {
    permission_granted: bool,
    sources: Vec<Arc<dyn LocationSource>>,
    fallback: Coordinate,
}

impl std::fmt::Debug for LocationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationProvider")
            .field("permission_granted", &self.permission_granted)
            .field("sources", &self.sources.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl LocationProvider {
    #[must_use]
    pub fn new(
        permission_granted: bool,
        sources: Vec<Arc<dyn LocationSource>>,
        fallback: Coordinate,
    ) -> Self {
        Self {
            permission_granted,
            sources,
            fallback,
        }
    }

    /// Build a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured fallback is out of range.
    pub fn from_config(config: &LocationConfig) -> Result<Self, String> {
        let sources = config
            .sources
            .iter()
            .map(|s| Arc::new(ConfiguredLocationSource::from_config(s)) as Arc<dyn LocationSource>)
            .collect();
        Ok(Self::new(
            config.permission_granted,
            sources,
            config.fallback()?,
        ))
    }

    /// Most accurate fix among enabled sources; earlier sources win ties
    async fn best_fix(&self) -> Option<LocationFix> {
        let mut best: Option<LocationFix> = None;
        for source in self.sources.iter().filter(|s| s.is_enabled()) {
            let Some(fix) = source.last_known().await else {
                debug!(source = source.name(), "No fix");
                continue;
            };
            if best.is_none_or(|b| fix.accuracy_m < b.accuracy_m) {
                best = Some(fix);
            }
        }
        best
    }
}

#[async_trait]
impl LocationPort for LocationProvider {
    #[instrument(skip(self))]
    async fn current_location(&self) -> Coordinate {
        if !self.permission_granted {
            debug!("Location permission denied, using fallback");
            return self.fallback;
        }

        match self.best_fix().await {
            Some(fix) => {
                debug!(accuracy_m = fix.accuracy_m, "Using best location fix");
                fix.coordinate
            },
            None => {
                debug!("No location fix available, using fallback");
                self.fallback
            },
        }
    }
}
