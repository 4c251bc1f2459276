//! Planning-session state
//!
//! Everything the presentation needs to render one trip-planning screen.
//! The orchestrator owns the only mutable instance; observers receive
//! clones.

use serde::{Deserialize, Serialize};

use super::{AddressCandidate, RouteOption};
use crate::value_objects::{Coordinate, Endpoint};

/// Where the current route list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// No routes loaded yet
    #[default]
    None,
    /// Fetched from the routing backend during this load
    Fresh,
    /// Read back from the local cache after a failed fetch
    Cached,
}

/// State of one planning session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningState {
    /// Origin coordinate
    pub from_coordinate: Option<Coordinate>,
    /// Destination coordinate
    pub to_coordinate: Option<Coordinate>,
    /// Origin address text
    pub from_address: String,
    /// Destination address text
    pub to_address: String,
    /// Current geocoding suggestions
    pub search_results: Vec<AddressCandidate>,
    /// Endpoint the current suggestions were searched for
    pub search_target: Option<Endpoint>,
    /// Current route list
    pub routes: Vec<RouteOption>,
    /// Origin of `routes`
    pub route_source: RouteSource,
    /// Whether a command is in progress
    pub is_loading: bool,
    /// Last user-visible error, cleared explicitly
    pub last_error: Option<String>,
}

impl PlanningState {
    /// Coordinate of the given endpoint
    #[must_use]
    pub const fn coordinate(&self, endpoint: Endpoint) -> Option<Coordinate> {
        match endpoint {
            Endpoint::From => self.from_coordinate,
            Endpoint::To => self.to_coordinate,
        }
    }

    /// Address text of the given endpoint
    #[must_use]
    pub fn address(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::From => &self.from_address,
            Endpoint::To => &self.to_address,
        }
    }

    /// Set coordinate and address text of one endpoint
    pub fn set_endpoint(
        &mut self,
        endpoint: Endpoint,
        coordinate: Coordinate,
        address: impl Into<String>,
    ) {
        let address = address.into();
        match endpoint {
            Endpoint::From => {
                self.from_coordinate = Some(coordinate);
                self.from_address = address;
            },
            Endpoint::To => {
                self.to_coordinate = Some(coordinate);
                self.to_address = address;
            },
        }
    }

    /// Both coordinates, if set
    #[must_use]
    pub const fn endpoints(&self) -> Option<(Coordinate, Coordinate)> {
        match (self.from_coordinate, self.to_coordinate) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }

    /// Exchange origin and destination
    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.from_coordinate, &mut self.to_coordinate);
        std::mem::swap(&mut self.from_address, &mut self.to_address);
    }
}
