//! Application services - Use case implementations

mod route_planner;
mod route_service;
mod search_debouncer;

pub use route_planner::{FallbackErrorPolicy, PlannerConfig, RoutePlanner};
pub use route_service::{RouteFetch, RouteService};
pub use search_debouncer::SearchDebouncer;
