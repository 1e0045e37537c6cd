//! Per-node progress of one plan execution.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::graph::StackGraph;
use crate::error::{Error, Result};

/// Execution state of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum NodeState {
    /// Not started yet.
    Pending,
    /// Handed to the provisioner.
    InProgress,
    /// Applied.
    Succeeded,
    /// The provisioner reported a failure.
    Failed,
    /// Not attempted because a dependency failed.
    Skipped {
        /// The failed node that blocked this one.
        blocked_by: String,
    },
    /// Not started because the run was cancelled.
    Cancelled,
}

impl NodeState {
    /// Whether the node will not change state again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::InProgress)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped { blocked_by } => write!(f, "skipped (blocked by {blocked_by})"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Tracks which nodes may start, following the graph's apply order.
///
/// A node becomes ready only once every dependency has succeeded. A failure
/// marks all transitive dependents as skipped; nodes already applied keep
/// their state.
///
/// # Examples
///
/// ```
/// use stackplan::stack::{NodeState, Rollout, StackGraph};
///
/// let mut graph = StackGraph::new();
/// graph.add_node("foundation", Vec::<String>::new()).unwrap();
/// graph.add_node("application", ["foundation"]).unwrap();
///
/// let mut rollout = Rollout::new(&graph).unwrap();
/// assert_eq!(rollout.ready(), vec!["foundation"]);
/// rollout.start("foundation").unwrap();
/// rollout.fail("foundation").unwrap();
/// assert!(matches!(rollout.state("application"), Some(NodeState::Skipped { .. })));
/// ```
#[derive(Debug, Clone)]
pub struct Rollout {
    order: Vec<String>,
    graph: StackGraph,
    states: BTreeMap<String, NodeState>,
}

impl Rollout {
    /// Starts tracking a graph; every node begins pending.
    ///
    /// # Errors
    ///
    /// Returns the graph's ordering error if it has unknown dependencies or
    /// a cycle.
    pub fn new(graph: &StackGraph) -> Result<Self> {
        let order = graph.topological_order()?;
        let states = order
            .iter()
            .map(|id| (id.clone(), NodeState::Pending))
            .collect();
        Ok(Self {
            order,
            graph: graph.clone(),
            states,
        })
    }

    /// The apply order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Current state of a node.
    #[must_use]
    pub fn state(&self, id: &str) -> Option<&NodeState> {
        self.states.get(id)
    }

    /// Pending nodes whose dependencies all succeeded, in apply order.
    #[must_use]
    pub fn ready(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.is_ready(id))
            .map(String::as_str)
            .collect()
    }

    /// Whether every node reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.states.values().all(NodeState::is_terminal)
    }

    /// Every node with its state, in apply order.
    #[must_use]
    pub fn states(&self) -> Vec<(String, NodeState)> {
        self.order
            .iter()
            .filter_map(|id| self.states.get(id).map(|s| (id.clone(), s.clone())))
            .collect()
    }

    /// Nodes that succeeded, in apply order.
    #[must_use]
    pub fn applied(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.states.get(id.as_str()) == Some(&NodeState::Succeeded))
            .map(String::as_str)
            .collect()
    }

    /// Moves a ready node to in-progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the node is unknown, not pending, or
    /// has a dependency that has not succeeded.
    pub fn start(&mut self, id: &str) -> Result<()> {
        if !self.is_ready(id) {
            return Err(Self::invalid(id, "start", self.states.get(id)));
        }
        self.set(id, NodeState::InProgress);
        Ok(())
    }

    /// Marks an in-progress node as applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the node is not in progress.
    pub fn succeed(&mut self, id: &str) -> Result<()> {
        self.finish(id, NodeState::Succeeded)?;
        log::info!("{id}: applied");
        Ok(())
    }

    /// Marks an in-progress node as failed and skips its dependents.
    ///
    /// Returns the ids that were skipped, in apply order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the node is not in progress.
    pub fn fail(&mut self, id: &str) -> Result<Vec<String>> {
        self.finish(id, NodeState::Failed)?;

        let dependents: BTreeSet<String> = self.graph.transitive_dependents(id);
        let mut skipped = Vec::new();
        for node in &self.order {
            if dependents.contains(node) && self.states.get(node) == Some(&NodeState::Pending) {
                skipped.push(node.clone());
            }
        }
        for node in &skipped {
            log::warn!("{node}: skipped, dependency {id} failed");
            self.set(
                node,
                NodeState::Skipped {
                    blocked_by: id.to_string(),
                },
            );
        }
        Ok(skipped)
    }

    /// Cancels every node that has not started.
    ///
    /// Returns the cancelled ids in apply order. In-progress nodes are left
    /// alone.
    pub fn cancel(&mut self) -> Vec<String> {
        let cancelled: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.states.get(id.as_str()) == Some(&NodeState::Pending))
            .cloned()
            .collect();
        for id in &cancelled {
            self.set(id, NodeState::Cancelled);
        }
        cancelled
    }

    fn is_ready(&self, id: &str) -> bool {
        self.states.get(id) == Some(&NodeState::Pending)
            && self.graph.dependencies(id).is_some_and(|deps| {
                deps.iter()
                    .all(|d| self.states.get(d) == Some(&NodeState::Succeeded))
            })
    }

    fn finish(&mut self, id: &str, state: NodeState) -> Result<()> {
        if self.states.get(id) != Some(&NodeState::InProgress) {
            return Err(Self::invalid(id, "finish", self.states.get(id)));
        }
        self.set(id, state);
        Ok(())
    }

    fn set(&mut self, id: &str, state: NodeState) {
        if let Some(slot) = self.states.get_mut(id) {
            *slot = state;
        }
    }

    fn invalid(id: &str, action: &str, state: Option<&NodeState>) -> Error {
        Error::Validation {
            field: "rollout".into(),
            message: match state {
                Some(state) => format!("cannot {action} '{id}' while it is {state}"),
                None => format!("cannot {action} unknown node '{id}'"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> StackGraph {
        let mut graph = StackGraph::new();
        graph.add_node("base", Vec::<String>::new()).unwrap();
        graph.add_node("left", ["base"]).unwrap();
        graph.add_node("right", ["base"]).unwrap();
        graph.add_node("top", ["left", "right"]).unwrap();
        graph.add_node("solo", Vec::<String>::new()).unwrap();
        graph
    }

    #[test]
    fn test_node_starts_only_after_dependencies_succeed() {
        let mut rollout = Rollout::new(&diamond()).unwrap();
        assert_eq!(rollout.ready(), vec!["base", "solo"]);
        assert!(rollout.start("left").is_err());

        rollout.start("base").unwrap();
        assert_eq!(rollout.ready(), vec!["solo"]);
        rollout.succeed("base").unwrap();
        assert_eq!(rollout.ready(), vec!["left", "right", "solo"]);

        for id in ["left", "right"] {
            rollout.start(id).unwrap();
            rollout.succeed(id).unwrap();
        }
        assert_eq!(rollout.ready(), vec!["solo", "top"]);
    }

    #[test]
    fn test_failure_skips_transitive_dependents_only() {
        let mut rollout = Rollout::new(&diamond()).unwrap();
        rollout.start("base").unwrap();
        rollout.succeed("base").unwrap();
        rollout.start("left").unwrap();

        let skipped = rollout.fail("left").unwrap();
        assert_eq!(skipped, vec!["top"]);
        assert_eq!(rollout.state("base"), Some(&NodeState::Succeeded));
        assert_eq!(rollout.state("right"), Some(&NodeState::Pending));
        assert_eq!(rollout.ready(), vec!["right", "solo"]);
        assert_eq!(rollout.applied(), vec!["base"]);
    }

    #[test]
    fn test_cancel_leaves_in_progress_nodes() {
        let mut rollout = Rollout::new(&diamond()).unwrap();
        rollout.start("base").unwrap();
        let cancelled = rollout.cancel();
        assert_eq!(cancelled, vec!["left", "right", "solo", "top"]);
        assert_eq!(rollout.state("top"), Some(&NodeState::Cancelled));
        assert_eq!(rollout.state("base"), Some(&NodeState::InProgress));
        assert!(!rollout.is_finished());

        rollout.succeed("base").unwrap();
        assert!(rollout.is_finished());
        assert!(rollout.ready().is_empty());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut rollout = Rollout::new(&diamond()).unwrap();
        assert!(rollout.succeed("base").is_err());
        assert!(rollout.start("missing").is_err());
        rollout.start("base").unwrap();
        assert!(rollout.start("base").is_err());
    }

    #[test]
    fn test_cyclic_graph_rejected() {
        let mut graph = StackGraph::new();
        graph.add_node("a", ["b"]).unwrap();
        graph.add_node("b", ["a"]).unwrap();
        assert!(matches!(Rollout::new(&graph), Err(Error::CyclicDependency { .. })));
    }
}
