//! Trip endpoint selector

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two trip locations a command or field refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Origin of the trip
    From,
    /// Destination of the trip
    To,
}

impl Endpoint {
    /// The opposite endpoint
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::From => Self::To,
            Self::To => Self::From,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "from" | "origin" => Ok(Self::From),
            "to" | "destination" => Ok(Self::To),
            _ => Err(format!("Invalid endpoint: {s}. Use 'from' or 'to'")),
        }
    }
}
