//! Deployment plan types.
//!
//! A [`DeploymentPlan`] is the artifact handed to the provisioning
//! collaborator: every unit in apply order, each with its resolved name,
//! rules, routing decisions, typed input and output handles, and the stable
//! address work it needs.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::binding::StableAddress;
use crate::context::DeploymentContext;
use crate::network::{NetworkRule, RoutingAssignment};

use super::sizing::ResourceSizing;

/// A typed reference to one output of one unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OutputHandle {
    /// Publishing unit.
    pub unit: String,
    /// Output name within the unit.
    pub output: String,
    /// Deployment-qualified name the output is exported under.
    pub export_name: String,
}

impl OutputHandle {
    /// Creates a handle whose export name is qualified by the unit's stack.
    #[must_use]
    pub fn new(context: &DeploymentContext, unit: &str, output: &str) -> Self {
        Self {
            unit: unit.to_string(),
            output: output.to_string(),
            export_name: format!("{}-{output}", context.stack_name(unit)),
        }
    }
}

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unit, self.output)
    }
}

/// What to do about the stable address of one traffic class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BindingAction {
    /// No binding yet: allocate a new address.
    Allocate {
        /// The traffic class.
        traffic_class: String,
    },
    /// Keep the address already bound.
    Reuse {
        /// The traffic class.
        traffic_class: String,
        /// The bound address.
        address: StableAddress,
        /// Resource currently holding the address.
        bound_resource_id: Option<String>,
    },
    /// Import an address declared in the registry.
    AdoptLiteral {
        /// The traffic class.
        traffic_class: String,
        /// The declared address.
        address: StableAddress,
    },
}

impl BindingAction {
    /// The traffic class this action is for.
    #[must_use]
    pub fn traffic_class(&self) -> &str {
        match self {
            Self::Allocate { traffic_class }
            | Self::Reuse { traffic_class, .. }
            | Self::AdoptLiteral { traffic_class, .. } => traffic_class,
        }
    }

    /// Returns a human-readable description of this action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Allocate { traffic_class } => {
                format!("Allocate a stable address for {traffic_class}")
            }
            Self::Reuse {
                traffic_class,
                address,
                bound_resource_id,
            } => match bound_resource_id {
                Some(resource) => {
                    format!("Keep {} for {traffic_class} (bound to {resource})", address.address)
                }
                None => format!("Keep {} for {traffic_class}", address.address),
            },
            Self::AdoptLiteral {
                traffic_class,
                address,
            } => format!("Adopt registry address {} for {traffic_class}", address.address),
        }
    }
}

/// One unit of provisioning work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningUnit {
    /// Unit id.
    pub id: String,
    /// What the unit provisions.
    pub description: String,
    /// Resolved stack name.
    pub stack_name: String,
    /// Units that must be applied first, sorted.
    pub depends_on: Vec<String>,
    /// Network rules owned by this unit.
    pub rules: Vec<NetworkRule>,
    /// Routing decisions, present on the frontend unit only.
    pub routing: Vec<RoutingAssignment>,
    /// Outputs of other units this unit reads.
    pub inputs: Vec<OutputHandle>,
    /// Outputs this unit publishes.
    pub outputs: Vec<OutputHandle>,
    /// Stable address work to do before the unit is applied.
    pub binding_actions: Vec<BindingAction>,
}

/// Identifying summary of the resolved context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    /// Application name.
    pub app: String,
    /// Application version.
    pub version: String,
    /// Environment id.
    pub environment: String,
    /// Location id.
    pub location: String,
    /// Location display name.
    pub location_display_name: String,
    /// Whether the environment is production.
    pub is_production: bool,
}

impl From<&DeploymentContext> for ContextSummary {
    fn from(context: &DeploymentContext) -> Self {
        Self {
            app: context.app_name().to_string(),
            version: context.app_version().to_string(),
            environment: context.environment().to_string(),
            location: context.location().to_string(),
            location_display_name: context.location_profile().display_name.clone(),
            is_production: context.is_production(),
        }
    }
}

/// The full, ordered deployment plan for one context.
///
/// Everything in the plan is derived deterministically from its inputs, so
/// serializing the same plan twice gives identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPlan {
    /// Which deployment this plan targets.
    pub context: ContextSummary,
    /// Derived sizing.
    pub sizing: ResourceSizing,
    /// Tags applied to every resource.
    pub tags: BTreeMap<String, String>,
    /// Units in apply order.
    pub units: Vec<ProvisioningUnit>,
    /// Warnings to communicate to the operator.
    pub warnings: Vec<String>,
}

impl DeploymentPlan {
    /// Looks up a unit by id.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&ProvisioningUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Unit ids in apply order.
    #[must_use]
    pub fn order(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.id.as_str()).collect()
    }

    /// Unit ids in teardown order.
    #[must_use]
    pub fn teardown_order(&self) -> Vec<&str> {
        self.units.iter().rev().map(|u| u.id.as_str()).collect()
    }

    /// Every stable address action across all units.
    pub fn binding_actions(&self) -> impl Iterator<Item = &BindingAction> {
        self.units.iter().flat_map(|u| u.binding_actions.iter())
    }

    /// Adds a warning to the plan.
    #[must_use]
    pub fn add_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}
