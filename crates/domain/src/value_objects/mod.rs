//! Value Objects - Immutable, identity-less domain primitives

mod bounding_box;
mod coordinate;
mod endpoint;

pub use bounding_box::{BoundingBox, DEFAULT_PADDING_DEGREES};
pub use coordinate::{Coordinate, InvalidCoordinates};
pub use endpoint::Endpoint;
