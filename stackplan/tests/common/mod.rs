//! Common test utilities for integration tests.
//!
//! Fixtures for registries, contexts, databases, and a scripted provisioner
//! that stands in for the cloud provider.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use stackplan::binding::StableAddress;
use stackplan::operations::{Provisioner, ProvisioningUnit, UnitOutcome};
use stackplan::{BindingKey, ConfigRegistry, Database, DatabaseConfig, DeploymentContext};

/// Builtin registry with one literal address appended.
#[allow(dead_code)]
pub fn registry_with_literal(environment: &str, class: &str, address: &str) -> ConfigRegistry {
    let yaml = format!(
        "{}\nstable_addresses:\n  {environment}:\n    {class}:\n      \
         address: {address}\n      allocation_id: eipalloc-literal\n",
        stackplan::config::BUILTIN_REGISTRY
    );
    ConfigRegistry::from_yaml(&yaml).unwrap()
}

/// Resolves a context against `registry`.
#[allow(dead_code)]
pub fn context(registry: &ConfigRegistry, environment: &str, location: &str) -> DeploymentContext {
    DeploymentContext::resolve(registry, environment, location).unwrap()
}

/// Opens a fresh database in its own temporary directory.
///
/// The directory is returned so the caller controls its lifetime.
#[allow(dead_code)]
pub fn create_test_database() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(DatabaseConfig::new(dir.path().join("bindings.db"))).unwrap();
    (dir, db)
}

/// A provisioner that records every call and hands out predictable ids.
///
/// Every declared output of an applied unit is published with the value
/// `<unit>.<output>`. Units that bind stable addresses report a fronting
/// resource named after the current generation, so bumping `generation`
/// simulates a replacement.
#[allow(dead_code)]
#[derive(Debug)]
pub struct ScriptedProvisioner {
    /// Units applied, in call order.
    pub applied: Vec<String>,
    /// Keys an address was allocated for, in call order.
    pub allocated: Vec<BindingKey>,
    /// Inputs each unit was last applied with.
    pub inputs: BTreeMap<String, BTreeMap<String, String>>,
    /// Units whose apply fails.
    pub failing: BTreeSet<String>,
    /// Suffix of fronting resource ids.
    pub generation: u32,
    next_octet: u8,
}

#[allow(dead_code)]
impl ScriptedProvisioner {
    pub fn new() -> Self {
        Self {
            applied: Vec::new(),
            allocated: Vec::new(),
            inputs: BTreeMap::new(),
            failing: BTreeSet::new(),
            generation: 1,
            next_octet: 10,
        }
    }

    pub fn failing_on(mut self, unit: &str) -> Self {
        self.failing.insert(unit.to_string());
        self
    }

    pub fn fronting_resource(&self, unit: &str) -> String {
        format!("i-{unit}-{}", self.generation)
    }
}

impl Provisioner for ScriptedProvisioner {
    fn allocate_address(&mut self, key: &BindingKey) -> anyhow::Result<StableAddress> {
        self.allocated.push(key.clone());
        let octet = self.next_octet;
        self.next_octet += 1;
        Ok(StableAddress::new(
            Ipv4Addr::new(203, 0, 113, octet),
            format!("eipalloc-{octet}"),
        ))
    }

    fn apply(
        &mut self,
        unit: &ProvisioningUnit,
        inputs: &BTreeMap<String, String>,
    ) -> anyhow::Result<UnitOutcome> {
        self.applied.push(unit.id.clone());
        self.inputs.insert(unit.id.clone(), inputs.clone());
        if self.failing.contains(&unit.id) {
            anyhow::bail!("provider rejected {}", unit.stack_name);
        }

        let outputs = unit
            .outputs
            .iter()
            .map(|handle| (handle.output.clone(), handle.to_string()))
            .collect();
        let resource = self.fronting_resource(&unit.id);
        let fronting_resources = unit
            .binding_actions
            .iter()
            .map(|action| (action.traffic_class().to_string(), resource.clone()))
            .collect();

        Ok(UnitOutcome {
            outputs,
            fronting_resources,
        })
    }
}
