//! Property-based tests for the topology planner.

use proptest::prelude::*;

use super::*;
use crate::config::ConfigRegistry;
use crate::context::DeploymentContext;
use crate::port::Port;

fn class_strategy() -> impl Strategy<Value = Vec<TrafficClass>> {
    prop::collection::btree_map(
        1u16..=65535,
        (any::<bool>(), any::<bool>(), any::<bool>()),
        1..8,
    )
    .prop_map(|by_port| {
        by_port
            .into_iter()
            .enumerate()
            .map(|(i, (port, (tcp, stateful, public)))| {
                TrafficClass::new(
                    format!("class{i}"),
                    if tcp { Protocol::Tcp } else { Protocol::Http },
                    Port::try_from(port).unwrap_or(Port::HTTP),
                    stateful,
                    if public { Exposure::Public } else { Exposure::Internal },
                )
            })
            .collect()
    })
}

fn plan(classes: &[TrafficClass]) -> NetworkPlan {
    let registry = ConfigRegistry::builtin().unwrap();
    let context = DeploymentContext::resolve(&registry, "beta", "eu-west-1").unwrap();
    let services = &registry.topology().services;
    TopologyPlanner::new(&context, registry.networking().private_cidr)
        .plan(&TopologyRequest {
            frontend_unit: "application",
            traffic_classes: classes,
            services,
            admin_access: None,
        })
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    // Same inputs, byte-identical output
    #[test]
    fn planning_is_deterministic(classes in class_strategy()) {
        let first = serde_json::to_string(&plan(&classes)).unwrap();
        let second = serde_json::to_string(&plan(&classes)).unwrap();
        prop_assert_eq!(first, second);
    }

    // Input order never changes the plan
    #[test]
    fn planning_ignores_declaration_order(classes in class_strategy()) {
        let mut reversed = classes.clone();
        reversed.reverse();
        prop_assert_eq!(plan(&classes), plan(&reversed));
    }

    // Internal classes are never reachable from any source
    #[test]
    fn internal_classes_never_open_to_any(classes in class_strategy()) {
        let plan = plan(&classes);
        let frontend = plan.rules_for("application");
        for class in classes.iter().filter(|c| c.exposure == Exposure::Internal) {
            let rule = frontend
                .iter()
                .find(|r| {
                    r.direction == Direction::Ingress
                        && r.port == class.port
                        && r.protocol == class.protocol
                })
                .unwrap();
            prop_assert!(!rule.source.is_any());
        }
    }

    // Egress is always scoped to the private range
    #[test]
    fn egress_never_open_to_any(classes in class_strategy()) {
        let plan = plan(&classes);
        for rules in plan.rules.values() {
            for rule in rules.iter().filter(|r| r.direction == Direction::Egress) {
                prop_assert!(!rule.source.is_any());
            }
        }
    }

    // Exactly the stateful TCP classes need a stable address
    #[test]
    fn stable_address_only_for_stateful_tcp(classes in class_strategy()) {
        let plan = plan(&classes);
        for class in &classes {
            let assignment = plan.assignment(&class.id).unwrap();
            prop_assert_eq!(
                assignment.stable_address_required,
                class.stateful && class.protocol == Protocol::Tcp
            );
            prop_assert_eq!(
                assignment.mechanism == RoutingMechanism::SharedHttpLayer,
                !class.stateful && class.protocol == Protocol::Http
            );
        }
    }
}
