//! Stable address binding types.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::context::DeploymentContext;
use crate::error::{Error, Result};

/// Lifecycle state of a stable address binding.
///
/// ```text
/// Unbound -> Allocated -> Associated <-> Reassociated
///                 \            \             /
///                  `------------`-> Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingState {
    /// No address yet.
    Unbound,
    /// Address allocated, not attached to a resource.
    Allocated,
    /// Attached to the resource fronting the traffic class.
    Associated,
    /// Re-pointed at a replacement resource.
    Reassociated,
    /// Given back on explicit decommission.
    Released,
}

impl BindingState {
    /// Storage and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Allocated => "allocated",
            Self::Associated => "associated",
            Self::Reassociated => "reassociated",
            Self::Released => "released",
        }
    }

    /// Whether the binding still holds its address.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Allocated | Self::Associated | Self::Reassociated)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stackplan::binding::BindingState;
    ///
    /// assert!(BindingState::Allocated.can_transition_to(BindingState::Associated));
    /// assert!(!BindingState::Allocated.can_transition_to(BindingState::Reassociated));
    /// assert!(!BindingState::Released.can_transition_to(BindingState::Associated));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unbound | Self::Released, Self::Allocated)
                | (Self::Allocated | Self::Reassociated, Self::Associated)
                | (Self::Associated | Self::Reassociated, Self::Reassociated)
                | (Self::Allocated | Self::Associated | Self::Reassociated, Self::Released)
        )
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unbound" => Ok(Self::Unbound),
            "allocated" => Ok(Self::Allocated),
            "associated" => Ok(Self::Associated),
            "reassociated" => Ok(Self::Reassociated),
            "released" => Ok(Self::Released),
            other => Err(Error::Validation {
                field: "binding_state".into(),
                message: format!("unknown binding state '{other}'"),
            }),
        }
    }
}

/// Identifies one binding: a traffic class within one deployment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingKey {
    /// Environment id.
    pub environment: String,
    /// Location id.
    pub location: String,
    /// Traffic class id.
    pub traffic_class: String,
}

impl BindingKey {
    /// Creates a binding key.
    #[must_use]
    pub fn new(
        environment: impl Into<String>,
        location: impl Into<String>,
        traffic_class: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            location: location.into(),
            traffic_class: traffic_class.into(),
        }
    }

    /// The key for `traffic_class` in the deployment `context` targets.
    #[must_use]
    pub fn for_context(context: &DeploymentContext, traffic_class: impl Into<String>) -> Self {
        Self::new(context.environment(), context.location(), traffic_class)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.environment, self.location, self.traffic_class)
    }
}

/// A provider-allocated public address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableAddress {
    /// The public address.
    pub address: Ipv4Addr,
    /// Provider-side allocation identifier.
    pub allocation_id: String,
}

impl StableAddress {
    /// Creates a stable address.
    #[must_use]
    pub fn new(address: Ipv4Addr, allocation_id: impl Into<String>) -> Self {
        Self {
            address,
            allocation_id: allocation_id.into(),
        }
    }
}

impl fmt::Display for StableAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.allocation_id)
    }
}

/// A persistent address bound to the resource fronting a traffic class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StableAddressBinding {
    /// Which deployment and class the binding belongs to.
    pub key: BindingKey,
    /// The address; fixed for the life of the binding.
    pub address: StableAddress,
    /// Resource currently holding the address.
    pub bound_resource_id: Option<String>,
    /// Lifecycle state.
    pub state: BindingState,
    /// When the address was allocated.
    #[serde(skip)]
    pub created_at: SystemTime,
    /// When the binding last changed.
    #[serde(skip)]
    pub updated_at: SystemTime,
}

impl StableAddressBinding {
    /// Whether the binding still holds its address.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip_names() {
        for state in [
            BindingState::Unbound,
            BindingState::Allocated,
            BindingState::Associated,
            BindingState::Reassociated,
            BindingState::Released,
        ] {
            assert_eq!(state.as_str().parse::<BindingState>().unwrap(), state);
        }
        assert!("bound".parse::<BindingState>().is_err());
    }

    #[test]
    fn test_lifecycle_transitions() {
        use BindingState::*;
        assert!(Unbound.can_transition_to(Allocated));
        assert!(Allocated.can_transition_to(Associated));
        assert!(Associated.can_transition_to(Reassociated));
        assert!(Reassociated.can_transition_to(Associated));
        assert!(Reassociated.can_transition_to(Reassociated));
        assert!(Associated.can_transition_to(Released));

        assert!(!Unbound.can_transition_to(Associated));
        assert!(!Allocated.can_transition_to(Reassociated));
        assert!(!Released.can_transition_to(Associated));
        assert!(!Released.can_transition_to(Released));
    }

    #[test]
    fn test_active_states() {
        assert!(!BindingState::Unbound.is_active());
        assert!(BindingState::Allocated.is_active());
        assert!(BindingState::Reassociated.is_active());
        assert!(!BindingState::Released.is_active());
    }

    #[test]
    fn test_key_display() {
        let key = BindingKey::new("production", "eu-west-1", "streaming-ingest");
        assert_eq!(key.to_string(), "production/eu-west-1/streaming-ingest");
    }
}
