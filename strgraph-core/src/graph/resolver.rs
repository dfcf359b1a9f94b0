//! Dependency Resolver
//!
//! The resolver determines the order in which nodes are evaluated. Every
//! node comes after all of its children.
//!
//! # Algorithm
//!
//! 1. Build the dependency graph: each node maps to the set of its distinct
//!    children. A child index with no node behind it still gets an entry
//!    (with no dependencies) so the evaluator can report it as undefined.
//! 2. Run Kahn's algorithm. Ready nodes are taken in store insertion order,
//!    which keeps the result stable across runs.
//! 3. If some nodes never become ready, the leftover part of the graph
//!    contains a cycle. We walk it to name the nodes of one cycle.

use std::collections::{HashMap, VecDeque};

use indexmap::{IndexMap, IndexSet};

use super::node::NodeIndex;
use super::store::NodeStore;
use crate::error::CycleDetected;

/// Snapshot of the dependency edges of a node store.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Node -> its distinct children, in store order.
    dependencies: IndexMap<NodeIndex, IndexSet<NodeIndex>>,
}

impl DependencyGraph {
    /// Build the dependency graph of every node in the store.
    pub fn from_store(store: &NodeStore) -> Self {
        let mut dependencies: IndexMap<NodeIndex, IndexSet<NodeIndex>> = store
            .iter()
            .map(|(index, node)| (index, node.children().iter().copied().collect()))
            .collect();

        let undefined: Vec<NodeIndex> = dependencies
            .values()
            .flatten()
            .copied()
            .filter(|child| !store.contains(*child))
            .collect();
        for child in undefined {
            dependencies.entry(child).or_default();
        }

        Self { dependencies }
    }

    /// Get the distinct children of a node.
    pub fn dependencies(&self, index: NodeIndex) -> Option<&IndexSet<NodeIndex>> {
        self.dependencies.get(&index)
    }

    /// Number of indices in the graph, undefined children included.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Perform a topological sort of the whole graph.
    ///
    /// Returns indices in order such that children come before their parents.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, CycleDetected> {
        let mut in_degree: IndexMap<NodeIndex, usize> = IndexMap::with_capacity(self.len());
        let mut dependents: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut queue = VecDeque::new();

        for (&index, children) in &self.dependencies {
            in_degree.insert(index, children.len());
            if children.is_empty() {
                queue.push_back(index);
            }
            for &child in children {
                dependents.entry(child).or_default().push(index);
            }
        }

        // Kahn's algorithm
        let mut order = Vec::with_capacity(self.len());
        while let Some(index) = queue.pop_front() {
            order.push(index);

            for dependent in dependents.get(&index).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() < self.len() {
            return Err(CycleDetected {
                cycle: self.find_cycle(&in_degree),
            });
        }
        Ok(order)
    }

    /// Extract one cycle from the nodes Kahn's algorithm could not release.
    ///
    /// A blocked node always has at least one blocked child, so following
    /// blocked children from any blocked node must eventually revisit one.
    fn find_cycle(&self, in_degree: &IndexMap<NodeIndex, usize>) -> Vec<NodeIndex> {
        let blocked = |index: &NodeIndex| in_degree.get(index).is_some_and(|degree| *degree > 0);

        let Some(mut current) = in_degree.keys().copied().find(|index| blocked(index)) else {
            return Vec::new();
        };

        let mut path = Vec::new();
        let mut position = HashMap::new();
        loop {
            if let Some(&start) = position.get(&current) {
                return path.split_off(start);
            }
            position.insert(current, path.len());
            path.push(current);

            match self
                .dependencies
                .get(&current)
                .and_then(|children| children.iter().copied().find(|child| blocked(child)))
            {
                Some(next) => current = next,
                None => return path,
            }
        }
    }
}

/// Compute an evaluation order for every node in the store.
pub fn resolve(store: &NodeStore) -> Result<Vec<NodeIndex>, CycleDetected> {
    let graph = DependencyGraph::from_store(store);
    let order = graph.topological_order()?;
    tracing::debug!(nodes = order.len(), "resolved evaluation order");
    Ok(order)
}
