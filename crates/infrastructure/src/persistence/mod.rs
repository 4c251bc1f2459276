//! Persistence module
//!
//! SQLite-based storage for the route cache.

pub mod connection;
pub mod migrations;
pub mod route_cache;

pub use connection::{ConnectionPool, DatabaseError, create_pool};
pub use route_cache::SqliteRouteCache;
