//! Routing mechanism selection per traffic class.

use std::fmt;

use serde::Serialize;

use super::traffic::{Protocol, TrafficClass};

/// The kind of front door a traffic class is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RoutingMechanism {
    /// Layer-7 load balancer shared by all stateless HTTP classes.
    SharedHttpLayer,
    /// Layer-4 load balancer pinned to a stable address.
    DedicatedStatefulLayer,
}

impl fmt::Display for RoutingMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedHttpLayer => write!(f, "shared-http-layer"),
            Self::DedicatedStatefulLayer => write!(f, "dedicated-stateful-layer"),
        }
    }
}

/// The routing decision for one traffic class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RoutingAssignment {
    /// The class being routed.
    pub traffic_class_id: String,
    /// Where it is routed through.
    pub mechanism: RoutingMechanism,
    /// Whether the front door must keep one address across replacements.
    pub stable_address_required: bool,
}

/// Chooses the routing mechanism for a traffic class.
///
/// Only stateless HTTP shares the HTTP layer. Everything else gets a
/// dedicated layer, and stateful TCP additionally needs a stable address.
///
/// # Examples
///
/// ```
/// use stackplan::network::{select_routing, RoutingMechanism, TrafficClass};
///
/// let assignment = select_routing(&TrafficClass::streaming_ingest());
/// assert_eq!(assignment.mechanism, RoutingMechanism::DedicatedStatefulLayer);
/// assert!(assignment.stable_address_required);
/// ```
#[must_use]
pub fn select_routing(class: &TrafficClass) -> RoutingAssignment {
    let mechanism = match (class.protocol, class.stateful) {
        (Protocol::Http, false) => RoutingMechanism::SharedHttpLayer,
        _ => RoutingMechanism::DedicatedStatefulLayer,
    };
    RoutingAssignment {
        traffic_class_id: class.id.clone(),
        mechanism,
        stable_address_required: class.stateful && class.protocol == Protocol::Tcp,
    }
}
