//! Map viewport bounds around a set of points

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Padding added on every side when fitting a route into view (~1 km)
pub const DEFAULT_PADDING_DEGREES: f64 = 0.01;

/// Axis-aligned latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Northern edge (max latitude)
    pub north: f64,
    /// Southern edge (min latitude)
    pub south: f64,
    /// Eastern edge (max longitude)
    pub east: f64,
    /// Western edge (min longitude)
    pub west: f64,
}

impl BoundingBox {
    /// Smallest box containing every point, grown by `padding` degrees.
    ///
    /// Returns `None` for an empty point set.
    #[must_use]
    pub fn around(points: &[Coordinate], padding: f64) -> Option<Self> {
        let first = points.first()?;
        let seed = Self {
            north: first.latitude(),
            south: first.latitude(),
            east: first.longitude(),
            west: first.longitude(),
        };

        let tight = points.iter().skip(1).fold(seed, |b, p| Self {
            north: b.north.max(p.latitude()),
            south: b.south.min(p.latitude()),
            east: b.east.max(p.longitude()),
            west: b.west.min(p.longitude()),
        });

        Some(Self {
            north: tight.north + padding,
            south: tight.south - padding,
            east: tight.east + padding,
            west: tight.west - padding,
        })
    }

    /// Center point of the box
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new_unchecked(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }
}
