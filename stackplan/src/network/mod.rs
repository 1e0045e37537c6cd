//! Network segmentation: traffic classes, access rules and routing.
//!
//! - [`TrafficClass`] and [`ServiceDependency`] describe what must be
//!   reachable.
//! - [`TopologyPlanner`] derives the [`NetworkRule`] set for every unit and a
//!   [`RoutingAssignment`] for every traffic class.

pub mod planner;
pub mod routing;
pub mod rule;
pub mod traffic;

#[cfg(test)]
mod proptests;

pub use planner::{
    AdminAccessRequest, NetworkPlan, TopologyPlanner, TopologyRequest, DEFAULT_ADMIN_ACCESS_HOURS,
    MAX_ADMIN_ACCESS_HOURS, MIN_ADMIN_PREFIX_LEN,
};
pub use routing::{select_routing, RoutingAssignment, RoutingMechanism};
pub use rule::{Direction, NetworkRule, RuleSource};
pub use traffic::{Exposure, Protocol, ServiceDependency, TrafficClass};
