//! Plan execution against an external provisioning collaborator.
//!
//! The executor owns the ordering contract only. Units are handed one at a
//! time to a [`Provisioner`]; a unit starts only once every unit it depends
//! on has been applied. A failure skips the failed unit's dependents and
//! leaves everything already applied in place.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::binding::{BindingKey, EndpointStabilityManager, StableAddress};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::stack::{NodeState, Rollout, StackGraph};

use super::plan::{BindingAction, ContextSummary, DeploymentPlan, ProvisioningUnit};

/// What the provisioner reports for an applied unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Published outputs by name.
    pub outputs: BTreeMap<String, String>,
    /// Resource now fronting each stable-address traffic class, by class id.
    pub fronting_resources: BTreeMap<String, String>,
}

/// The external collaborator that creates cloud resources.
#[cfg_attr(test, mockall::automock)]
pub trait Provisioner {
    /// Allocates a new public address for `key`.
    ///
    /// # Errors
    ///
    /// Any provider error; it is surfaced verbatim.
    fn allocate_address(&mut self, key: &BindingKey) -> anyhow::Result<StableAddress>;

    /// Applies one unit.
    ///
    /// `inputs` maps each input's export name to its resolved value, plus
    /// `<traffic class>-address` for every stable address the unit binds.
    ///
    /// # Errors
    ///
    /// Any provider error; it is surfaced verbatim.
    fn apply(
        &mut self,
        unit: &ProvisioningUnit,
        inputs: &BTreeMap<String, String>,
    ) -> anyhow::Result<UnitOutcome>;
}

/// Shared flag that stops a run before its next unit starts.
///
/// # Examples
///
/// ```
/// use stackplan::operations::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let handle = flag.clone();
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of executing a plan.
#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Whether the run was cancelled.
    pub cancelled: bool,
    /// Final state of every unit, in apply order.
    pub states: Vec<(String, NodeState)>,
    /// Failed units with their error, verbatim.
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<(String, Error)>,
    /// Outputs published by applied units, keyed by unit then output name.
    pub outputs: BTreeMap<String, BTreeMap<String, String>>,
    /// Descriptions of the work done, or that would be done on a dry run.
    pub actions_taken: Vec<String>,
}

#[allow(clippy::ptr_arg)]
fn serialize_failures<S>(
    failures: &Vec<(String, Error)>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(failures.len()))?;
    for (unit, error) in failures {
        map.serialize_entry(unit, &error.to_string())?;
    }
    map.end()
}

impl ExecutionReport {
    /// Whether every unit was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self.failures.is_empty()
            && (self.dry_run || self.states.iter().all(|(_, s)| *s == NodeState::Succeeded))
    }

    /// Final state of one unit.
    #[must_use]
    pub fn state(&self, unit: &str) -> Option<&NodeState> {
        self.states.iter().find(|(id, _)| id == unit).map(|(_, s)| s)
    }
}

/// Executes deployment plans.
///
/// # Examples
///
/// ```no_run
/// use stackplan::database::{Database, DatabaseConfig};
/// use stackplan::operations::{DeploymentPlan, PlanExecutor, Provisioner};
///
/// fn run<P: Provisioner>(plan: &DeploymentPlan, provisioner: &mut P) {
///     let mut db = Database::open(DatabaseConfig::new("/tmp/bindings.db")).unwrap();
///     let report = PlanExecutor::new(provisioner, &mut db).execute(plan).unwrap();
///     for (unit, state) in &report.states {
///         println!("{unit}: {state}");
///     }
/// }
/// ```
pub struct PlanExecutor<'a, P: Provisioner> {
    provisioner: &'a mut P,
    bindings: EndpointStabilityManager<'a>,
    cancellation: CancellationFlag,
    dry_run: bool,
}

impl<'a, P: Provisioner> PlanExecutor<'a, P> {
    /// Creates an executor recording bindings in `db`.
    pub fn new(provisioner: &'a mut P, db: &'a mut Database) -> Self {
        Self {
            provisioner,
            bindings: EndpointStabilityManager::new(db),
            cancellation: CancellationFlag::new(),
            dry_run: false,
        }
    }

    /// Sets the executor to dry-run mode: nothing is allocated or applied.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Uses `flag` to stop the run early.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Executes the plan.
    ///
    /// Unit failures do not make this return `Err`; they are recorded in
    /// the report together with the state of every other unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan's own unit graph is malformed.
    pub fn execute(&mut self, plan: &DeploymentPlan) -> Result<ExecutionReport> {
        let mut graph = StackGraph::new();
        for unit in &plan.units {
            graph.add_node(unit.id.clone(), unit.depends_on.iter().cloned())?;
        }
        let mut rollout = Rollout::new(&graph)?;

        let mut report = ExecutionReport {
            dry_run: self.dry_run,
            cancelled: false,
            states: Vec::new(),
            failures: Vec::new(),
            outputs: BTreeMap::new(),
            actions_taken: Vec::new(),
        };

        if self.dry_run {
            for unit in &plan.units {
                report
                    .actions_taken
                    .extend(unit.binding_actions.iter().map(BindingAction::description));
                report
                    .actions_taken
                    .push(format!("Apply {} ({})", unit.id, unit.stack_name));
            }
            report.states = rollout.states();
            return Ok(report);
        }

        loop {
            let Some(id) = rollout.ready().first().map(|id| (*id).to_string()) else {
                break;
            };
            if self.cancellation.is_cancelled() {
                let cancelled = rollout.cancel();
                log::warn!("run cancelled; not starting {}", cancelled.join(", "));
                report.cancelled = true;
                break;
            }
            let Some(unit) = plan.unit(&id) else {
                return Err(Error::NotFound {
                    resource: format!("unit '{id}'"),
                });
            };

            rollout.start(&id)?;
            log::info!("applying {} ({})", unit.id, unit.stack_name);

            match self.apply_unit(&plan.context, unit, &report.outputs) {
                Ok((outcome, actions)) => {
                    rollout.succeed(&id)?;
                    report.actions_taken.extend(actions);
                    report.outputs.insert(id, outcome.outputs);
                }
                Err(error) => {
                    log::error!("{error}");
                    let skipped = rollout.fail(&id)?;
                    if !skipped.is_empty() {
                        log::warn!("skipping {} after {id} failed", skipped.join(", "));
                    }
                    report.failures.push((id, error));
                }
            }
        }

        report.states = rollout.states();
        Ok(report)
    }

    fn apply_unit(
        &mut self,
        context: &ContextSummary,
        unit: &ProvisioningUnit,
        applied: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<(UnitOutcome, Vec<String>)> {
        let mut inputs = BTreeMap::new();
        for handle in &unit.inputs {
            let value = applied
                .get(&handle.unit)
                .and_then(|outputs| outputs.get(&handle.output))
                .ok_or_else(|| Error::ProvisioningFailure {
                    node: unit.id.clone(),
                    source: anyhow::anyhow!("missing input {handle}"),
                })?;
            inputs.insert(handle.export_name.clone(), value.clone());
        }

        let mut actions = Vec::new();
        let mut keys = Vec::new();
        for action in &unit.binding_actions {
            let key = BindingKey::new(
                &context.environment,
                &context.location,
                action.traffic_class(),
            );
            let address = self.ensure_binding(unit, &key, action)?;
            inputs.insert(format!("{}-address", key.traffic_class), address.address.to_string());
            actions.push(action.description());
            keys.push(key);
        }

        let outcome = self
            .provisioner
            .apply(unit, &inputs)
            .map_err(|source| Error::ProvisioningFailure {
                node: unit.id.clone(),
                source,
            })?;
        actions.push(format!("Apply {} ({})", unit.id, unit.stack_name));

        for key in &keys {
            if let Some(resource) = outcome.fronting_resources.get(&key.traffic_class) {
                self.point_binding_at(key, resource)?;
                actions.push(format!("Bind {key} to {resource}"));
            }
        }

        Ok((outcome, actions))
    }

    // Allocation happens before the unit is applied, so the dedicated layer
    // is always created against an existing address.
    fn ensure_binding(
        &mut self,
        unit: &ProvisioningUnit,
        key: &BindingKey,
        action: &BindingAction,
    ) -> Result<StableAddress> {
        if let Some(active) = self.bindings.active(key)? {
            let planned = match action {
                BindingAction::AdoptLiteral { address, .. }
                | BindingAction::Reuse { address, .. } => Some(address),
                BindingAction::Allocate { .. } => None,
            };
            return match planned {
                Some(address) if address.address != active.address.address => {
                    Err(Error::AddressBindingConflict {
                        traffic_class: key.traffic_class.clone(),
                        existing: active.address.address.to_string(),
                        requested: address.address.to_string(),
                    })
                }
                _ => Ok(active.address),
            };
        }

        let binding = match action {
            BindingAction::AdoptLiteral { address, .. } => {
                self.bindings.adopt_literal(key, address)?
            }
            BindingAction::Allocate { .. } | BindingAction::Reuse { .. } => {
                let address = self
                    .provisioner
                    .allocate_address(key)
                    .map_err(|source| Error::ProvisioningFailure {
                        node: unit.id.clone(),
                        source,
                    })?;
                self.bindings.allocate(key, &address)?
            }
        };
        Ok(binding.address)
    }

    fn point_binding_at(&mut self, key: &BindingKey, resource: &str) -> Result<()> {
        let current = self
            .bindings
            .active(key)?
            .and_then(|binding| binding.bound_resource_id);

        match current {
            Some(previous) if previous != resource => {
                self.bindings.reassociate(key, &previous, resource)?;
            }
            _ => {
                self.bindings.associate(key, resource)?;
            }
        }
        Ok(())
    }
}
