//! Route option returned by the routing backend

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::{BoundingBox, Coordinate, DEFAULT_PADDING_DEGREES};

/// One candidate route between the trip endpoints
///
/// The identifier is unique within a single fetch and doubles as the
/// cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
    /// Backend-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Travel time in seconds
    pub duration_secs: u64,
    /// Distance as reported by the backend
    pub distance: f64,
    /// Ticket price (non-negative)
    pub price: f64,
    /// Transport mode tag ("bus", "metro", ...), not interpreted
    pub transport_type: String,
    /// Path polyline, possibly empty
    #[serde(default)]
    pub points: Vec<Coordinate>,
}

impl RouteOption {
    /// Travel time as `"1 h 5 min"`, `"2 h"` or `"45 min"`
    #[must_use]
    pub fn format_duration(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        match (hours, minutes) {
            (h, m) if h > 0 && m > 0 => format!("{h} h {m} min"),
            (h, _) if h > 0 => format!("{h} h"),
            (_, m) => format!("{m} min"),
        }
    }

    /// Price truncated to whole roubles
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn format_price(&self) -> String {
        format!("{} RUB", self.price.trunc() as i64)
    }

    /// Viewport fitting the whole path, `None` when there is no path
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::around(&self.points, DEFAULT_PADDING_DEGREES)
    }

    /// Compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        format!(
            "{} [{}] {}, {}",
            self.name,
            self.transport_type,
            self.format_duration(),
            self.format_price()
        )
    }
}

impl fmt::Display for RouteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}
