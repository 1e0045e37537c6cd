//! Property-based tests for deployment planning.

use ipnet::Ipv4Net;
use proptest::prelude::*;
use std::net::Ipv4Addr;

use super::*;
use crate::config::ConfigRegistry;
use crate::context::DeploymentContext;
use crate::error::Error;
use crate::network::AdminAccessRequest;

fn pair_strategy() -> impl Strategy<Value = (&'static str, &'static str)> {
    (
        prop::sample::select(vec!["beta", "staging", "production"]),
        prop::sample::select(vec!["eu-west-1", "us-east-1", "ap-southeast-1"]),
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    // The same inputs always serialize to the same bytes
    #[test]
    fn plan_is_byte_identical((env, loc) in pair_strategy()) {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, env, loc).unwrap();
        let planner = DeploymentPlanner::new(&registry, &context);

        let first = planner.plan(&PlanOptions::new(), &[]).unwrap();
        let second = planner.plan(&PlanOptions::new(), &[]).unwrap();
        let first = serde_yaml::to_string(&first).unwrap();
        let second = serde_yaml::to_string(&second).unwrap();
        prop_assert_eq!(first, second);
    }

    // Admin access is accepted exactly when it is narrow, short and non-production
    #[test]
    fn admin_access_policy(
        (env, loc) in pair_strategy(),
        octets in any::<[u8; 4]>(),
        prefix in 0u8..=32,
        hours in 0u32..=48,
    ) {
        let registry = ConfigRegistry::builtin().unwrap();
        let context = DeploymentContext::resolve(&registry, env, loc).unwrap();
        let source = Ipv4Net::new(Ipv4Addr::from(octets), prefix).unwrap().trunc();
        let admin = AdminAccessRequest::new(source).with_duration_hours(hours);

        let result = DeploymentPlanner::new(&registry, &context)
            .plan(&PlanOptions::new().with_admin_access(Some(admin)), &[]);

        let allowed = env != "production" && prefix >= 24 && (1..=24).contains(&hours);
        if allowed {
            prop_assert!(result.is_ok());
        } else {
            let is_policy_violation = matches!(result, Err(Error::PolicyViolation { .. }));
            prop_assert!(is_policy_violation);
        }
    }

    // Stack names never collide between units or environments of one location
    #[test]
    fn stack_names_unique((env_a, loc) in pair_strategy(), (env_b, _) in pair_strategy()) {
        let registry = ConfigRegistry::builtin().unwrap();
        let a = DeploymentContext::resolve(&registry, env_a, loc).unwrap();
        let b = DeploymentContext::resolve(&registry, env_b, loc).unwrap();
        let plan_a = DeploymentPlanner::new(&registry, &a).plan(&PlanOptions::new(), &[]).unwrap();
        let plan_b = DeploymentPlanner::new(&registry, &b).plan(&PlanOptions::new(), &[]).unwrap();

        for unit_a in &plan_a.units {
            for unit_b in &plan_b.units {
                let same = env_a == env_b && unit_a.id == unit_b.id;
                prop_assert_eq!(same, unit_a.stack_name == unit_b.stack_name);
            }
        }
    }
}
