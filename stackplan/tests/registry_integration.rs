//! Integration tests for registry loading and custom topologies.
//!
//! Tests touching process environment variables run serially.

mod common;

use std::env;
use std::fs;

use serial_test::serial;
use stackplan::config::loader::{REGISTRY_ENV, REGISTRY_FILE_NAME};
use stackplan::config::{InputSource, RegistrySource, BUILTIN_REGISTRY};
use stackplan::network::RoutingMechanism;
use stackplan::{
    ConfigRegistry, DeploymentContext, DeploymentPlanner, Error, ErrorCategory, InvocationInputs,
    PlanOptions, RegistryLoader,
};

const THREE_UNIT_TOPOLOGY: &str = r"
topology:
  frontend_unit: edge
  units:
    - id: network
      description: Network only
      publishes: [vpc-id]
    - id: data
      depends_on: [network]
      consumes:
        - unit: network
          output: vpc-id
      publishes: [db-endpoint]
    - id: edge
      consumes:
        - unit: data
          output: db-endpoint
      publishes: [alb-dns]
  traffic_classes:
    - id: control-plane
      protocol: http
      port: 80
      exposure: public
    - id: streaming-ingest
      protocol: tcp
      port: 1935
      stateful: true
      exposure: public
  services:
    - consumer: edge
      provider: data
      service: database
      port: 5432
";

const CYCLIC_TOPOLOGY: &str = r"
topology:
  frontend_unit: edge
  units:
    - id: data
      depends_on: [edge]
      publishes: [db-endpoint]
    - id: edge
      consumes:
        - unit: data
          output: db-endpoint
  traffic_classes:
    - id: control-plane
      protocol: http
      port: 80
      exposure: public
";

const SERVICE_ONLY_TOPOLOGY: &str = r"
topology:
  frontend_unit: app
  units:
    - id: app
    - id: db
  traffic_classes:
    - id: control-plane
      protocol: http
      port: 80
      exposure: public
  services:
    - consumer: app
      provider: db
      service: database
      port: 5432
";

fn with_topology(topology: &str) -> ConfigRegistry {
    ConfigRegistry::from_yaml(&format!("{BUILTIN_REGISTRY}{topology}")).unwrap()
}

fn clear_env() {
    for var in [REGISTRY_ENV, "STACKPLAN_ENVIRONMENT", "STACKPLAN_LOCATION"] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_discovers_registry_in_parent_directory() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("services").join("ingest");
    fs::create_dir_all(&nested).unwrap();
    let registry_path = dir.path().join(REGISTRY_FILE_NAME);
    fs::write(&registry_path, format!("{BUILTIN_REGISTRY}{THREE_UNIT_TOPOLOGY}")).unwrap();

    let (registry, source) = RegistryLoader::load(None, &nested).unwrap();

    assert_eq!(source, RegistrySource::File(registry_path));
    assert_eq!(registry.topology().frontend_unit, "edge");
}

#[test]
#[serial]
fn test_registry_env_wins_over_discovery() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(REGISTRY_FILE_NAME), "not: [valid").unwrap();
    let explicit = dir.path().join("custom.yaml");
    fs::write(&explicit, BUILTIN_REGISTRY).unwrap();

    env::set_var(REGISTRY_ENV, &explicit);
    let loaded = RegistryLoader::load(None, dir.path());
    clear_env();

    let (_, source) = loaded.unwrap();
    assert_eq!(source, RegistrySource::File(explicit));
}

#[test]
#[serial]
fn test_missing_explicit_registry_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let err = RegistryLoader::load(Some(&missing), dir.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }), "{err}");
}

#[test]
#[serial]
fn test_invocation_inputs_from_environment_variables() {
    clear_env();
    let registry = ConfigRegistry::builtin().unwrap();

    env::set_var("STACKPLAN_ENVIRONMENT", "production");
    env::set_var("STACKPLAN_LOCATION", "ap-southeast-1");
    let from_env = InvocationInputs::resolve(&registry, None, None);
    let from_flag = InvocationInputs::resolve(&registry, Some("staging"), None);
    clear_env();

    let from_env = from_env.unwrap();
    assert_eq!(from_env.environment, "production");
    assert_eq!(from_env.environment_source, InputSource::Environment);
    assert_eq!(from_env.location, "ap-southeast-1");

    let from_flag = from_flag.unwrap();
    assert_eq!(from_flag.environment, "staging");
    assert_eq!(from_flag.environment_source, InputSource::Flag);
    assert_eq!(from_flag.location_source, InputSource::Environment);
}

#[test]
#[serial]
fn test_invocation_defaults_resolve_to_beta_in_primary_location() {
    clear_env();
    let registry = ConfigRegistry::builtin().unwrap();
    let inputs = InvocationInputs::resolve(&registry, None, None).unwrap();
    let context = DeploymentContext::from_inputs(&registry, &inputs).unwrap();

    assert_eq!(context.environment(), "beta");
    assert_eq!(context.location(), "eu-west-1");
    assert_eq!(inputs.location_source, InputSource::Default);
}

#[test]
fn test_unknown_location_lists_valid_ones() {
    let registry = ConfigRegistry::builtin().unwrap();
    let err = DeploymentContext::resolve(&registry, "beta", "eu-central-1").unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(
        err.to_string(),
        "unknown location 'eu-central-1'; valid locations: ap-southeast-1, eu-west-1, us-east-1"
    );
}

#[test]
fn test_custom_topology_orders_by_consumed_outputs() {
    let registry = with_topology(THREE_UNIT_TOPOLOGY);
    let context = DeploymentContext::resolve(&registry, "staging", "eu-west-1").unwrap();
    let plan = DeploymentPlanner::new(&registry, &context)
        .plan(&PlanOptions::new(), &[])
        .unwrap();

    assert_eq!(plan.order(), vec!["network", "data", "edge"]);
    assert_eq!(plan.teardown_order(), vec!["edge", "data", "network"]);

    let edge = plan.unit("edge").unwrap();
    assert_eq!(edge.depends_on, vec!["data"]);
    assert_eq!(edge.inputs[0].export_name, "streamr-p2p-staging-ireland-data-db-endpoint");
    let mechanisms: Vec<_> = edge.routing.iter().map(|r| r.mechanism).collect();
    assert_eq!(
        mechanisms,
        vec![
            RoutingMechanism::SharedHttpLayer,
            RoutingMechanism::DedicatedStatefulLayer
        ]
    );

    // The data unit owns the service and accepts the edge's connections.
    let data = plan.unit("data").unwrap();
    assert!(data.rules.iter().any(|rule| rule.port.value() == 5432));
    assert!(data.routing.is_empty());
}

#[test]
fn test_cyclic_topology_fails_to_plan() {
    let registry = with_topology(CYCLIC_TOPOLOGY);
    let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
    let err = DeploymentPlanner::new(&registry, &context)
        .plan(&PlanOptions::new(), &[])
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Graph);
    assert_eq!(err.to_string(), "cyclic dependency: data -> edge -> data");
}

#[test]
fn test_topology_with_undeclared_output_is_rejected() {
    let broken = THREE_UNIT_TOPOLOGY.replace("output: db-endpoint", "output: db-password");
    let err = ConfigRegistry::from_yaml(&format!("{BUILTIN_REGISTRY}{broken}")).unwrap_err();
    assert!(err.to_string().contains("data.db-password"), "{err}");
}

#[test]
fn test_service_provider_is_applied_before_its_consumer() {
    let registry = with_topology(SERVICE_ONLY_TOPOLOGY);
    let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
    let plan = DeploymentPlanner::new(&registry, &context)
        .plan(&PlanOptions::new(), &[])
        .unwrap();

    assert_eq!(plan.order(), vec!["db", "app"]);
    assert_eq!(plan.teardown_order(), vec!["app", "db"]);
    assert_eq!(plan.unit("app").unwrap().depends_on, vec!["db".to_string()]);
}
