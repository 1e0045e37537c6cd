//! Network access rules derived by the topology planner.

use std::fmt;

use ipnet::Ipv4Net;
use serde::{Serialize, Serializer};

use super::traffic::Protocol;
use crate::port::Port;

/// Traffic direction relative to the unit owning the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Inbound.
    Ingress,
    /// Outbound.
    Egress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => write!(f, "ingress"),
            Self::Egress => write!(f, "egress"),
        }
    }
}

/// The peer range a rule admits. For egress rules this is the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleSource {
    /// Any IPv4 address.
    AnyIpv4,
    /// A specific range.
    Cidr(Ipv4Net),
}

impl RuleSource {
    /// Returns `true` for the unrestricted source.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::AnyIpv4)
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyIpv4 => write!(f, "0.0.0.0/0"),
            Self::Cidr(net) => write!(f, "{net}"),
        }
    }
}

impl Serialize for RuleSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One ingress or egress permission.
///
/// Field order matters: the derived ordering sorts rules by direction, then
/// port, which keeps rendered rule sets stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NetworkRule {
    /// Inbound or outbound.
    pub direction: Direction,
    /// Port the rule opens.
    pub port: Port,
    /// Protocol carried on the port.
    pub protocol: Protocol,
    /// Peer range.
    pub source: RuleSource,
    /// Operator-facing description.
    pub description: String,
    /// Lifetime of a time-bounded rule, in hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after_hours: Option<u32>,
}

impl NetworkRule {
    /// Creates an ingress rule.
    #[must_use]
    pub fn ingress(
        protocol: Protocol,
        port: Port,
        source: RuleSource,
        description: impl Into<String>,
    ) -> Self {
        Self {
            direction: Direction::Ingress,
            port,
            protocol,
            source,
            description: description.into(),
            expires_after_hours: None,
        }
    }

    /// Creates an egress rule.
    #[must_use]
    pub fn egress(
        protocol: Protocol,
        port: Port,
        destination: RuleSource,
        description: impl Into<String>,
    ) -> Self {
        Self {
            direction: Direction::Egress,
            port,
            protocol,
            source: destination,
            description: description.into(),
            expires_after_hours: None,
        }
    }

    /// Marks the rule as time-bounded.
    #[must_use]
    pub const fn expiring_after(mut self, hours: u32) -> Self {
        self.expires_after_hours = Some(hours);
        self
    }
}

impl fmt::Display for NetworkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} {} {} ({})",
            self.direction,
            self.protocol,
            self.port,
            match self.direction {
                Direction::Ingress => "from",
                Direction::Egress => "to",
            },
            self.source,
            self.description
        )?;
        if let Some(hours) = self.expires_after_hours {
            write!(f, " [expires after {hours}h]")?;
        }
        Ok(())
    }
}
