//! Network topology planning.
//!
//! The planner turns the declared traffic classes and service dependencies
//! into per-unit rule sets and routing assignments. It reads nothing but its
//! inputs, so the same inputs always give the same plan.

use std::collections::{BTreeMap, BTreeSet};

use ipnet::Ipv4Net;
use serde::Serialize;

use super::routing::{select_routing, RoutingAssignment};
use super::rule::{NetworkRule, RuleSource};
use super::traffic::{Exposure, Protocol, ServiceDependency, TrafficClass};
use crate::config::TopologyConfig;
use crate::context::DeploymentContext;
use crate::error::{Error, Result};
use crate::port::Port;

/// Longest administrative access window that can be requested.
pub const MAX_ADMIN_ACCESS_HOURS: u32 = 24;

/// Smallest prefix length accepted for an administrative access source.
pub const MIN_ADMIN_PREFIX_LEN: u8 = 24;

/// Default administrative access window.
pub const DEFAULT_ADMIN_ACCESS_HOURS: u32 = 4;

/// A request for temporary operator access to the frontend unit.
///
/// # Examples
///
/// ```
/// use stackplan::network::AdminAccessRequest;
///
/// let request = AdminAccessRequest::new("198.51.100.7/32".parse().unwrap())
///     .with_duration_hours(2);
/// assert_eq!(request.port.value(), 22);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminAccessRequest {
    /// The operator's address range.
    pub source: Ipv4Net,
    /// Port to open.
    pub port: Port,
    /// How long the rule may exist.
    pub duration_hours: u32,
}

impl AdminAccessRequest {
    /// SSH access from `source` for the default window.
    #[must_use]
    pub const fn new(source: Ipv4Net) -> Self {
        Self {
            source,
            port: Port::SSH,
            duration_hours: DEFAULT_ADMIN_ACCESS_HOURS,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: Port) -> Self {
        self.port = port;
        self
    }

    /// Sets the access window.
    #[must_use]
    pub const fn with_duration_hours(mut self, hours: u32) -> Self {
        self.duration_hours = hours;
        self
    }
}

/// Everything the planner needs beyond the context.
#[derive(Debug, Clone, Copy)]
pub struct TopologyRequest<'a> {
    /// Unit receiving the traffic-class ingress rules.
    pub frontend_unit: &'a str,
    /// Exposed traffic classes.
    pub traffic_classes: &'a [TrafficClass],
    /// Service dependency edges.
    pub services: &'a [ServiceDependency],
    /// Optional operator access request.
    pub admin_access: Option<&'a AdminAccessRequest>,
}

impl<'a> TopologyRequest<'a> {
    /// Builds a request from a registry topology.
    #[must_use]
    pub fn from_topology(
        topology: &'a TopologyConfig,
        admin_access: Option<&'a AdminAccessRequest>,
    ) -> Self {
        Self {
            frontend_unit: &topology.frontend_unit,
            traffic_classes: &topology.traffic_classes,
            services: &topology.services,
            admin_access,
        }
    }
}

/// Rule sets per unit and routing assignments per traffic class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPlan {
    /// Sorted, duplicate-free rules keyed by unit id.
    pub rules: BTreeMap<String, Vec<NetworkRule>>,
    /// Routing assignments sorted by traffic class id.
    pub assignments: Vec<RoutingAssignment>,
}

impl NetworkPlan {
    /// Rules owned by `unit`; empty if it has none.
    #[must_use]
    pub fn rules_for(&self, unit: &str) -> &[NetworkRule] {
        self.rules.get(unit).map_or(&[], Vec::as_slice)
    }

    /// The assignment for a traffic class.
    #[must_use]
    pub fn assignment(&self, traffic_class_id: &str) -> Option<&RoutingAssignment> {
        self.assignments
            .iter()
            .find(|a| a.traffic_class_id == traffic_class_id)
    }

    /// Traffic classes that need a stable address.
    pub fn stable_address_classes(&self) -> impl Iterator<Item = &str> {
        self.assignments
            .iter()
            .filter(|a| a.stable_address_required)
            .map(|a| a.traffic_class_id.as_str())
    }
}

/// Computes network plans for one deployment context.
///
/// # Examples
///
/// ```
/// use stackplan::{ConfigRegistry, DeploymentContext};
/// use stackplan::network::{TopologyPlanner, TopologyRequest};
///
/// let registry = ConfigRegistry::builtin().unwrap();
/// let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
/// let planner = TopologyPlanner::new(&context, registry.networking().private_cidr);
/// let plan = planner
///     .plan(&TopologyRequest::from_topology(registry.topology(), None))
///     .unwrap();
/// assert_eq!(plan.stable_address_classes().collect::<Vec<_>>(), vec!["streaming-ingest"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TopologyPlanner<'a> {
    context: &'a DeploymentContext,
    private_range: Ipv4Net,
}

impl<'a> TopologyPlanner<'a> {
    /// Creates a planner for `context` whose private range is `private_range`.
    #[must_use]
    pub const fn new(context: &'a DeploymentContext, private_range: Ipv4Net) -> Self {
        Self {
            context,
            private_range,
        }
    }

    /// Computes the rule sets and routing assignments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyViolation`] if administrative access is
    /// requested for a production environment or is too broad or too long,
    /// and [`Error::Validation`] if two traffic classes share an id or a
    /// protocol and port.
    pub fn plan(&self, request: &TopologyRequest<'_>) -> Result<NetworkPlan> {
        Self::check_traffic_classes(request.traffic_classes)?;

        let private = RuleSource::Cidr(self.private_range);
        let mut rules: BTreeMap<String, BTreeSet<NetworkRule>> = BTreeMap::new();
        let mut add = |unit: &str, rule: NetworkRule| {
            log::debug!("{unit}: {rule}");
            rules.entry(unit.to_string()).or_default().insert(rule);
        };

        for class in request.traffic_classes {
            let source = match class.exposure {
                Exposure::Public => RuleSource::AnyIpv4,
                Exposure::Internal => private,
            };
            add(
                request.frontend_unit,
                NetworkRule::ingress(
                    class.protocol,
                    class.port,
                    source,
                    format!("Allow {} {} traffic", class.exposure, class.id),
                ),
            );
        }

        for service in request.services {
            add(
                &service.consumer,
                NetworkRule::egress(
                    Protocol::Tcp,
                    service.port,
                    private,
                    format!("Allow {} access to {}", service.consumer, service.service),
                ),
            );
            add(
                &service.provider,
                NetworkRule::ingress(
                    Protocol::Tcp,
                    service.port,
                    private,
                    format!("Allow {} access from private range", service.service),
                ),
            );
        }

        if let Some(admin) = request.admin_access {
            self.check_admin_access(admin)?;
            add(
                request.frontend_unit,
                NetworkRule::ingress(
                    Protocol::Tcp,
                    admin.port,
                    RuleSource::Cidr(admin.source),
                    "Temporary operator administrative access",
                )
                .expiring_after(admin.duration_hours),
            );
        }

        let mut assignments: Vec<RoutingAssignment> =
            request.traffic_classes.iter().map(select_routing).collect();
        assignments.sort();

        Ok(NetworkPlan {
            rules: rules
                .into_iter()
                .map(|(unit, set)| (unit, set.into_iter().collect()))
                .collect(),
            assignments,
        })
    }

    fn check_traffic_classes(classes: &[TrafficClass]) -> Result<()> {
        let mut ids = BTreeSet::new();
        let mut endpoints = BTreeSet::new();
        for class in classes {
            if !ids.insert(class.id.as_str()) {
                return Err(Error::Validation {
                    field: "traffic_classes".into(),
                    message: format!("duplicate traffic class '{}'", class.id),
                });
            }
            if !endpoints.insert((class.protocol, class.port)) {
                return Err(Error::Validation {
                    field: "traffic_classes".into(),
                    message: format!(
                        "traffic class '{}' reuses {}/{}",
                        class.id, class.protocol, class.port
                    ),
                });
            }
        }
        Ok(())
    }

    fn check_admin_access(&self, admin: &AdminAccessRequest) -> Result<()> {
        let violation = |details: String| Error::PolicyViolation {
            environment: self.context.environment().to_string(),
            details,
        };

        if self.context.is_production() {
            return Err(violation(
                "administrative access rules are not permitted in production".into(),
            ));
        }
        if admin.source.prefix_len() < MIN_ADMIN_PREFIX_LEN {
            return Err(violation(format!(
                "administrative access source {} is broader than /{MIN_ADMIN_PREFIX_LEN}",
                admin.source
            )));
        }
        if admin.duration_hours == 0 || admin.duration_hours > MAX_ADMIN_ACCESS_HOURS {
            return Err(violation(format!(
                "administrative access must last between 1 and {MAX_ADMIN_ACCESS_HOURS} hours, \
                 got {}",
                admin.duration_hours
            )));
        }
        log::warn!(
            "granting administrative access from {} for {} hours",
            admin.source,
            admin.duration_hours
        );
        Ok(())
    }
}
