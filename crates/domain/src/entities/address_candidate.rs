//! Geocoding search result

use serde::{Deserialize, Serialize};

use crate::value_objects::Coordinate;

/// A single geocoding result: a name, its full address and where it is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCandidate {
    /// Short display name (street + house number, place name, ...)
    pub name: String,
    /// Full formatted address including city
    pub formatted_address: String,
    /// Location of the candidate
    pub coordinate: Coordinate,
}

impl AddressCandidate {
    /// Create a new candidate
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        formatted_address: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            name: name.into(),
            formatted_address: formatted_address.into(),
            coordinate,
        }
    }

    /// Candidate for a raw point, labelled with its own coordinates
    #[must_use]
    pub fn from_point(coordinate: Coordinate) -> Self {
        let label = coordinate.to_string();
        Self {
            name: label.clone(),
            formatted_address: label,
            coordinate,
        }
    }
}
