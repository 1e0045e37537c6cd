//! Property-based tests for dependency ordering.

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;
use crate::error::Error;

// Random DAG: node i may only depend on nodes with a smaller index.
fn dag_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1usize..12).prop_flat_map(|n| {
        let picks = prop::collection::vec(any::<prop::sample::Index>(), 0..4);
        prop::collection::vec(picks, n).prop_map(move |picks| {
            picks
                .into_iter()
                .enumerate()
                .map(|(i, deps)| {
                    let deps = if i == 0 {
                        Vec::new()
                    } else {
                        deps.iter().map(|d| format!("n{:02}", d.index(i))).collect()
                    };
                    (format!("n{i:02}"), deps)
                })
                .collect()
        })
    })
}

fn build(nodes: &[(String, Vec<String>)]) -> StackGraph {
    let mut graph = StackGraph::new();
    for (id, deps) in nodes {
        graph.add_node(id.clone(), deps.clone()).unwrap();
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // Every node appears after all of its dependencies
    #[test]
    fn order_respects_dependencies(nodes in dag_strategy()) {
        let order = build(&nodes).topological_order().unwrap();
        prop_assert_eq!(order.len(), nodes.len());
        let position: BTreeMap<&str, usize> =
            order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        for (id, deps) in &nodes {
            for dep in deps {
                prop_assert!(position[dep.as_str()] < position[id.as_str()]);
            }
        }
    }

    // Insertion order never changes the result
    #[test]
    fn order_independent_of_insertion(nodes in dag_strategy()) {
        let mut shuffled = nodes.clone();
        shuffled.reverse();
        prop_assert_eq!(
            build(&nodes).topological_order().unwrap(),
            build(&shuffled).topological_order().unwrap()
        );
    }

    // Teardown is the exact reverse of apply
    #[test]
    fn reverse_is_mirror(nodes in dag_strategy()) {
        let graph = build(&nodes);
        let mut forward = graph.topological_order().unwrap();
        forward.reverse();
        prop_assert_eq!(forward, graph.reverse_order().unwrap());
    }

    // Closing a back edge always yields a cycle that starts at its smallest id
    #[test]
    fn back_edge_reports_cycle(nodes in dag_strategy()) {
        prop_assume!(nodes.len() > 1);
        let mut cyclic = nodes.clone();
        let last = cyclic.len() - 1;
        let first_id = cyclic[0].0.clone();
        let last_id = cyclic[last].0.clone();
        cyclic[0].1.push(last_id);
        cyclic[last].1.push(first_id);

        match build(&cyclic).topological_order() {
            Err(Error::CyclicDependency { cycle }) => {
                prop_assert!(!cycle.is_empty());
                let min = cycle.iter().min().unwrap();
                prop_assert_eq!(&cycle[0], min);
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other.map(|o| o.len())),
        }
    }
}
