//! Application layer - Use cases and orchestration
//!
//! Holds the collaborator ports, the route fetch-with-fallback policy, the
//! planning-session orchestrator and the per-field search debouncer.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
