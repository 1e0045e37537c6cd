//! Deployment planning and execution using the plan-execute pattern.
//!
//! # Architecture
//!
//! Operations are split into two phases:
//! 1. **Planning**: [`DeploymentPlanner`] resolves naming, rules, routing,
//!    apply order and stable address work into a [`DeploymentPlan`]. Every
//!    configuration, policy and graph error surfaces here.
//! 2. **Execution**: [`PlanExecutor`] hands units to a [`Provisioner`] in
//!    apply order and keeps the binding store in step.
//!
//! # Examples
//!
//! ```
//! use stackplan::{ConfigRegistry, DeploymentContext};
//! use stackplan::operations::{DeploymentPlanner, PlanOptions};
//!
//! let registry = ConfigRegistry::builtin().unwrap();
//! let context = DeploymentContext::resolve(&registry, "staging", "eu-west-1").unwrap();
//! let plan = DeploymentPlanner::new(&registry, &context)
//!     .plan(&PlanOptions::new(), &[])
//!     .unwrap();
//! assert_eq!(plan.sizing.instance_type, "t3.small");
//! ```

pub mod executor;
pub mod plan;
pub mod planner;
pub mod sizing;

#[cfg(test)]
mod proptests;

pub use executor::{CancellationFlag, ExecutionReport, PlanExecutor, Provisioner, UnitOutcome};
pub use plan::{BindingAction, ContextSummary, DeploymentPlan, OutputHandle, ProvisioningUnit};
pub use planner::{DeploymentPlanner, PlanOptions};
pub use sizing::{RemovalPolicy, ResourceSizing};
