//! Domain entities - Objects with identity and lifecycle

mod address_candidate;
mod planning_state;
mod route_option;

pub use address_candidate::AddressCandidate;
pub use planning_state::{PlanningState, RouteSource};
pub use route_option::RouteOption;
