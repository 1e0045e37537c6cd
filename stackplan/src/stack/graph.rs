//! Dependency graph over provisioning units.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Error, Result};

/// A provisioning unit and the units it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackNode {
    /// Unit id.
    pub id: String,
    /// Units that must be applied first.
    pub depends_on: BTreeSet<String>,
}

/// A directed graph of provisioning units.
///
/// Edges point from a unit to its dependencies. Unknown dependencies and
/// cycles are reported when an order is requested, so nodes can be added in
/// any order.
///
/// # Examples
///
/// ```
/// use stackplan::stack::StackGraph;
///
/// let mut graph = StackGraph::new();
/// graph.add_node("application", ["foundation"]).unwrap();
/// graph.add_node("foundation", Vec::<String>::new()).unwrap();
///
/// assert_eq!(graph.topological_order().unwrap(), vec!["foundation", "application"]);
/// assert_eq!(graph.reverse_order().unwrap(), vec!["application", "foundation"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackGraph {
    nodes: BTreeMap<String, BTreeSet<String>>,
}

impl StackGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateNode`] if `id` was already added.
    pub fn add_node<I, S>(&mut self, id: impl Into<String>, depends_on: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateNode { id });
        }
        let depends_on = depends_on.into_iter().map(Into::into).collect();
        self.nodes.insert(id, depends_on);
        Ok(())
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is a node.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The direct dependencies of `id`.
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = StackNode> + '_ {
        self.nodes.iter().map(|(id, deps)| StackNode {
            id: id.clone(),
            depends_on: deps.clone(),
        })
    }

    /// Every node that depends on `id`, directly or transitively.
    #[must_use]
    pub fn transitive_dependents(&self, id: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for (node, deps) in &self.nodes {
                if deps.contains(&current) && found.insert(node.clone()) {
                    frontier.push(node.clone());
                }
            }
        }
        found
    }

    /// Apply order: every node after all of its dependencies, ties broken
    /// lexicographically by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDependency`] if a node depends on an id that
    /// was never added, and [`Error::CyclicDependency`] naming one cycle,
    /// starting at its smallest id, if the graph is cyclic.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        for (node, deps) in &self.nodes {
            if let Some(missing) = deps.iter().find(|d| !self.nodes.contains_key(*d)) {
                return Err(Error::UnknownDependency {
                    node: node.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        let mut remaining: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();
        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(next) = ready.pop_first() {
            remaining.remove(next);
            order.push(next.to_string());
            for (id, deps) in &self.nodes {
                if deps.contains(next) {
                    if let Some(count) = remaining.get_mut(id.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(id.as_str());
                        }
                    }
                }
            }
        }

        if remaining.is_empty() {
            Ok(order)
        } else {
            let unresolved: BTreeSet<&str> = remaining.keys().copied().collect();
            Err(Error::CyclicDependency {
                cycle: self.find_cycle(&unresolved),
            })
        }
    }

    /// Teardown order: the exact reverse of [`StackGraph::topological_order`].
    ///
    /// # Errors
    ///
    /// Same as [`StackGraph::topological_order`].
    pub fn reverse_order(&self) -> Result<Vec<String>> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }

    /// Walks dependency edges inside `unresolved` until a node repeats.
    ///
    /// Every unresolved node has at least one unresolved dependency, so the
    /// walk always closes a cycle.
    fn find_cycle(&self, unresolved: &BTreeSet<&str>) -> Vec<String> {
        let Some(&start) = unresolved.first() else {
            return Vec::new();
        };
        let mut path: Vec<&str> = vec![start];
        let mut position: BTreeMap<&str, usize> = BTreeMap::from([(start, 0)]);

        loop {
            let current = path[path.len() - 1];
            let next = self
                .nodes
                .get(current)
                .and_then(|deps| deps.iter().find(|d| unresolved.contains(d.as_str())));
            let Some(next) = next else {
                return path.iter().map(ToString::to_string).collect();
            };
            if let Some(&index) = position.get(next.as_str()) {
                let mut cycle: Vec<String> =
                    path[index..].iter().map(ToString::to_string).collect();
                if let Some(min) = cycle
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)
                {
                    cycle.rotate_left(min);
                }
                return cycle;
            }
            position.insert(next.as_str(), path.len());
            path.push(next.as_str());
        }
    }
}
