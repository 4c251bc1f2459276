//! Domain layer for the trip planner
//!
//! Contains the coordinates, address candidates, route options and the
//! planning-session state shared by every other layer. This crate performs
//! no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
