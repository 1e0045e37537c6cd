//! Deployment plan assembly.
//!
//! The planner is the validation gate: every configuration, policy, graph
//! and binding error is raised here, before anything is handed to the
//! provisioning collaborator.

use std::collections::BTreeSet;

use crate::binding::{BindingKey, StableAddress, StableAddressBinding};
use crate::config::{ConfigRegistry, TopologyConfig};
use crate::context::DeploymentContext;
use crate::error::{Error, Result};
use crate::network::{AdminAccessRequest, NetworkPlan, TopologyPlanner, TopologyRequest};
use crate::stack::StackGraph;

use super::plan::{BindingAction, ContextSummary, DeploymentPlan, OutputHandle, ProvisioningUnit};
use super::sizing::ResourceSizing;

/// Options for a planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Temporary administrative access to open on the frontend unit.
    pub admin_access: Option<AdminAccessRequest>,
}

impl PlanOptions {
    /// Creates options with no administrative access.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the administrative access request.
    #[must_use]
    pub fn with_admin_access(mut self, admin_access: Option<AdminAccessRequest>) -> Self {
        self.admin_access = admin_access;
        self
    }
}

/// Builds [`DeploymentPlan`]s for one resolved context.
///
/// Planning is pure: the current bindings are passed in rather than read
/// from the store, so the same inputs always give the same plan.
///
/// # Examples
///
/// ```
/// use stackplan::{ConfigRegistry, DeploymentContext};
/// use stackplan::operations::{DeploymentPlanner, PlanOptions};
///
/// let registry = ConfigRegistry::builtin().unwrap();
/// let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
/// let plan = DeploymentPlanner::new(&registry, &context)
///     .plan(&PlanOptions::new(), &[])
///     .unwrap();
/// assert_eq!(plan.order(), vec!["foundation", "application"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DeploymentPlanner<'a> {
    registry: &'a ConfigRegistry,
    context: &'a DeploymentContext,
}

impl<'a> DeploymentPlanner<'a> {
    /// Creates a planner.
    #[must_use]
    pub const fn new(registry: &'a ConfigRegistry, context: &'a DeploymentContext) -> Self {
        Self { registry, context }
    }

    /// Builds the graph of provisioning units.
    ///
    /// A unit depends on everything it lists in `depends_on`, on every unit
    /// whose outputs it consumes, and on every unit providing a service it
    /// connects to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateNode`] if two units share an id.
    pub fn build_graph(topology: &TopologyConfig) -> Result<StackGraph> {
        let mut graph = StackGraph::new();
        for unit in &topology.units {
            let providers = topology
                .services
                .iter()
                .filter(|s| s.consumer == unit.id && s.provider != unit.id)
                .map(|s| s.provider.as_str());
            let deps: BTreeSet<&str> = unit
                .depends_on
                .iter()
                .map(String::as_str)
                .chain(unit.consumes.iter().map(|r| r.unit.as_str()))
                .chain(providers)
                .collect();
            graph.add_node(unit.id.clone(), deps)?;
        }
        Ok(graph)
    }

    /// Builds the plan.
    ///
    /// `existing` holds the bindings currently in the store for any
    /// deployment; only active bindings for this context are considered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyViolation`] for disallowed administrative
    /// access, [`Error::CyclicDependency`] or [`Error::UnknownDependency`]
    /// for a malformed unit graph, and [`Error::AddressBindingConflict`]
    /// when a registry-declared address disagrees with an active binding.
    pub fn plan(
        &self,
        options: &PlanOptions,
        existing: &[StableAddressBinding],
    ) -> Result<DeploymentPlan> {
        let topology = self.registry.topology();

        let network = TopologyPlanner::new(self.context, self.registry.networking().private_cidr)
            .plan(&TopologyRequest::from_topology(topology, options.admin_access.as_ref()))?;

        let graph = Self::build_graph(topology)?;
        let order = graph.topological_order()?;

        let binding_actions = self.binding_actions(&network, existing)?;

        let mut units = Vec::with_capacity(order.len());
        for id in &order {
            let Some(definition) = topology.unit(id) else {
                return Err(Error::NotFound {
                    resource: format!("unit '{id}'"),
                });
            };
            let is_frontend = *id == topology.frontend_unit;

            units.push(ProvisioningUnit {
                id: id.clone(),
                description: definition.description.clone(),
                stack_name: self.context.stack_name(id),
                depends_on: graph
                    .dependencies(id)
                    .map(|deps| deps.iter().cloned().collect())
                    .unwrap_or_default(),
                rules: network.rules_for(id).to_vec(),
                routing: if is_frontend {
                    network.assignments.clone()
                } else {
                    Vec::new()
                },
                inputs: definition
                    .consumes
                    .iter()
                    .map(|r| OutputHandle::new(self.context, &r.unit, &r.output))
                    .collect(),
                outputs: definition
                    .publishes
                    .iter()
                    .map(|output| OutputHandle::new(self.context, id, output))
                    .collect(),
                binding_actions: if is_frontend {
                    binding_actions.clone()
                } else {
                    Vec::new()
                },
            });
        }

        let mut plan = DeploymentPlan {
            context: ContextSummary::from(self.context),
            sizing: ResourceSizing::derive(self.context),
            tags: self.context.tags(),
            units,
            warnings: Vec::new(),
        };

        if let Some(admin) = &options.admin_access {
            plan = plan.add_warning(format!(
                "temporary administrative access from {} on port {} expires after {} hours",
                admin.source, admin.port, admin.duration_hours
            ));
        }
        if !self.registry.networking().nat_gateway {
            plan = plan.add_warning(
                "NAT gateway disabled; private subnets have no outbound internet access",
            );
        }

        log::info!(
            "planned {} units for {}/{}",
            plan.units.len(),
            self.context.environment(),
            self.context.location()
        );
        Ok(plan)
    }

    fn binding_actions(
        &self,
        network: &NetworkPlan,
        existing: &[StableAddressBinding],
    ) -> Result<Vec<BindingAction>> {
        let literals = self.registry.literal_addresses(self.context.environment());

        network
            .stable_address_classes()
            .map(|class| {
                let key = BindingKey::for_context(self.context, class);
                let active = existing.iter().find(|b| b.key == key && b.is_active());
                let literal = literals
                    .and_then(|l| l.get(class))
                    .map(|l| StableAddress::new(l.address, l.allocation_id.clone()));

                match (active, literal) {
                    (Some(binding), Some(literal))
                        if binding.address.address != literal.address =>
                    {
                        Err(Error::AddressBindingConflict {
                            traffic_class: class.to_string(),
                            existing: binding.address.address.to_string(),
                            requested: literal.address.to_string(),
                        })
                    }
                    (Some(binding), _) => Ok(BindingAction::Reuse {
                        traffic_class: class.to_string(),
                        address: binding.address.clone(),
                        bound_resource_id: binding.bound_resource_id.clone(),
                    }),
                    (None, Some(address)) => Ok(BindingAction::AdoptLiteral {
                        traffic_class: class.to_string(),
                        address,
                    }),
                    (None, None) => Ok(BindingAction::Allocate {
                        traffic_class: class.to_string(),
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::SystemTime;

    use super::*;
    use crate::binding::BindingState;
    use crate::config::{OutputRef, UnitDefinition};
    use crate::network::{Direction, RoutingMechanism};

    fn plan_for(environment: &str, location: &str) -> DeploymentPlan {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, environment, location).unwrap();
        DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new(), &[])
            .unwrap()
    }

    fn binding(environment: &str, last: u8, state: BindingState) -> StableAddressBinding {
        StableAddressBinding {
            key: BindingKey::new(environment, "eu-west-1", "streaming-ingest"),
            address: StableAddress::new(Ipv4Addr::new(203, 0, 113, last), "eipalloc-1"),
            bound_resource_id: Some("i-0abc".into()),
            state,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_standard_plan_shape() {
        let plan = plan_for("staging", "us-east-1");
        assert_eq!(plan.order(), vec!["foundation", "application"]);
        assert_eq!(plan.teardown_order(), vec!["application", "foundation"]);

        let application = plan.unit("application").unwrap();
        assert_eq!(application.stack_name, "streamr-p2p-staging-virginia-application");
        assert_eq!(application.depends_on, vec!["foundation"]);
        assert_eq!(application.routing.len(), 3);
        assert_eq!(application.inputs.len(), 7);
        assert_eq!(
            application.binding_actions,
            vec![BindingAction::Allocate {
                traffic_class: "streaming-ingest".into()
            }]
        );

        let foundation = plan.unit("foundation").unwrap();
        assert!(foundation.routing.is_empty());
        assert!(foundation.binding_actions.is_empty());
        assert!(foundation
            .rules
            .iter()
            .all(|r| r.direction == Direction::Ingress && !r.source.is_any()));
    }

    #[test]
    fn test_routing_on_frontend() {
        let plan = plan_for("beta", "eu-west-1");
        let routing = &plan.unit("application").unwrap().routing;
        let ingest = routing
            .iter()
            .find(|a| a.traffic_class_id == "streaming-ingest")
            .unwrap();
        assert_eq!(ingest.mechanism, RoutingMechanism::DedicatedStatefulLayer);
        assert!(routing
            .iter()
            .filter(|a| a.traffic_class_id != "streaming-ingest")
            .all(|a| a.mechanism == RoutingMechanism::SharedHttpLayer));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let first = serde_json::to_string(&plan_for("production", "eu-west-1")).unwrap();
        let second = serde_json::to_string(&plan_for("production", "eu-west-1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_binding_is_reused() {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
        let existing = vec![
            binding("beta", 10, BindingState::Associated),
            binding("staging", 11, BindingState::Associated),
        ];

        let plan = DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new(), &existing)
            .unwrap();
        let actions: Vec<_> = plan.binding_actions().collect();
        assert!(matches!(
            actions[0],
            BindingAction::Reuse { address, .. }
                if address.address == Ipv4Addr::new(203, 0, 113, 10)
        ));
    }

    #[test]
    fn test_released_binding_is_reallocated() {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
        let existing = vec![binding("beta", 10, BindingState::Released)];

        let plan = DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new(), &existing)
            .unwrap();
        assert!(matches!(
            plan.binding_actions().next(),
            Some(BindingAction::Allocate { .. })
        ));
    }

    #[test]
    fn test_literal_adoption_and_conflict() {
        let yaml = format!(
            "{}\nstable_addresses:\n  beta:\n    streaming-ingest:\n      \
             address: 198.51.100.7\n      allocation_id: eipalloc-legacy\n",
            crate::config::BUILTIN_REGISTRY
        );
        let registry = ConfigRegistry::from_yaml(&yaml).unwrap();
        let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
        let planner = DeploymentPlanner::new(&registry, &context);

        let plan = planner.plan(&PlanOptions::new(), &[]).unwrap();
        assert!(matches!(
            plan.binding_actions().next(),
            Some(BindingAction::AdoptLiteral { address, .. })
                if address.allocation_id == "eipalloc-legacy"
        ));

        let existing = vec![binding("beta", 10, BindingState::Associated)];
        let err = planner.plan(&PlanOptions::new(), &existing).unwrap_err();
        assert!(matches!(err, Error::AddressBindingConflict { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Binding);
    }

    #[test]
    fn test_admin_access_adds_warning_and_rule() {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
        let admin = AdminAccessRequest::new("198.51.100.0/28".parse().unwrap());

        let plan = DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new().with_admin_access(Some(admin)), &[])
            .unwrap();
        assert!(plan.warnings.iter().any(|w| w.contains("expires after 4 hours")));
        assert!(plan
            .unit("application")
            .unwrap()
            .rules
            .iter()
            .any(|r| r.expires_after_hours == Some(4)));
    }

    #[test]
    fn test_admin_access_refused_in_production() {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, "production", "eu-west-1").unwrap();
        let admin = AdminAccessRequest::new("198.51.100.0/28".parse().unwrap());

        let err = DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new().with_admin_access(Some(admin)), &[])
            .unwrap_err();
        assert!(matches!(err, Error::PolicyViolation { .. }));
        assert!(err.is_pre_provisioning());
    }

    #[test]
    fn test_build_graph_includes_consumed_units() {
        let mut topology = ConfigRegistry::builtin().unwrap().topology().clone();
        topology.units.push(UnitDefinition {
            id: "edge".into(),
            description: String::new(),
            depends_on: Vec::new(),
            consumes: vec![OutputRef::new("application", "alb-dns")],
            publishes: Vec::new(),
        });

        let graph = DeploymentPlanner::build_graph(&topology).unwrap();
        assert_eq!(
            graph.topological_order().unwrap(),
            vec!["foundation", "application", "edge"]
        );
    }

    #[test]
    fn test_cyclic_units_rejected() {
        let mut topology = ConfigRegistry::builtin().unwrap().topology().clone();
        topology.units[0].depends_on.push("application".into());

        let graph = DeploymentPlanner::build_graph(&topology).unwrap();
        match graph.topological_order() {
            Err(Error::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["application", "foundation"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }
}
