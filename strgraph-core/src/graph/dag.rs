//! The DAG
//!
//! [`Dag`] ties the node store, the resolver and the dispatcher together.
//!
//! # Execution
//!
//! `execute` walks the graph in dependency order:
//!
//! 1. Resolve the order (cached until the next mutation). A cycle aborts the
//!    run before any node is touched.
//! 2. Check that every index in the order holds a node. A dangling child
//!    aborts the run, again before any node is touched.
//! 3. Evaluate every calc node. The first failing node aborts the run; nodes
//!    evaluated before it keep their new values.
//!
//! Every run recomputes every calc node. Nothing is memoized across runs.

use std::fmt;

use indexmap::IndexMap;

use super::node::{Node, NodeIndex};
use super::resolver;
use super::store::{ChildRef, NewNode, NodeStore};
use crate::error::{DagError, DagResult};
use crate::ops::Dispatcher;

/// A graph of string computations.
#[derive(Debug, Default)]
pub struct Dag {
    store: NodeStore,

    /// Cached evaluation order. `None` after any mutation.
    order: Option<Vec<NodeIndex>>,

    /// Index of the node whose value `execute` returns.
    result: Option<NodeIndex>,

    dispatcher: Dispatcher,
}

impl Dag {
    /// Create an empty DAG with the default backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty DAG that dispatches through `dispatcher`.
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            ..Self::default()
        }
    }

    /// Set up a node containing a constant value, replacing any node at
    /// `index`.
    pub fn set_const(&mut self, index: NodeIndex, value: impl Into<String>) {
        self.store.insert(Some(index), NewNode::Const(value.into()));
        self.invalidate();
    }

    /// Set up a node whose value is computed from `children` with
    /// `operation`, replacing any node at `index`.
    ///
    /// If `mark_as_result` is set the node becomes the result of the DAG.
    pub fn set_calc(
        &mut self,
        index: NodeIndex,
        operation: &str,
        children: &[NodeIndex],
        mark_as_result: bool,
    ) -> DagResult<()> {
        self.insert_calc(
            Some(index),
            operation,
            children.iter().copied().map(ChildRef::Index),
        )?;
        if mark_as_result {
            self.result = Some(index);
        }
        Ok(())
    }

    /// Insert a calc node whose children may be literal values.
    ///
    /// Literals become new constant nodes. With `index == None` the next
    /// free index is used. Returns the index of the calc node.
    pub fn insert_calc(
        &mut self,
        index: Option<NodeIndex>,
        operation: &str,
        children: impl IntoIterator<Item = ChildRef>,
    ) -> DagResult<NodeIndex> {
        if operation.is_empty() {
            return Err(DagError::InvalidArgument(
                "operation name must not be empty".into(),
            ));
        }

        let index = self.store.insert(
            index,
            NewNode::Calc {
                operation: operation.to_owned(),
                children: children.into_iter().collect(),
            },
        );
        self.invalidate();
        Ok(index)
    }

    /// Delete a node.
    ///
    /// Clears the result designation if it pointed at this node. Deleting an
    /// index that holds no node is an error and changes nothing.
    pub fn delete(&mut self, index: NodeIndex) -> DagResult<()> {
        self.store.remove(index).ok_or(DagError::NotFound(index))?;
        if self.result == Some(index) {
            self.result = None;
        }
        self.invalidate();
        Ok(())
    }

    /// Remove every node and the result designation.
    pub fn clear(&mut self) {
        self.store.clear();
        self.result = None;
        self.invalidate();
    }

    /// Snapshot of every node's value, in insertion order.
    ///
    /// Calc nodes that have not been evaluated map to `None`.
    pub fn values(&self) -> IndexMap<NodeIndex, Option<String>> {
        self.store.values()
    }

    /// Get a reference to a node.
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.store.get(index)
    }

    /// Iterate over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Index of the result node, if one is designated.
    pub fn result(&self) -> Option<NodeIndex> {
        self.result
    }

    /// Designate the result node, or clear the designation with `None`.
    pub fn set_result(&mut self, index: Option<NodeIndex>) -> DagResult<()> {
        if let Some(index) = index {
            if !self.store.contains(index) {
                return Err(DagError::NotFound(index));
            }
        }
        self.result = index;
        Ok(())
    }

    /// Operations the native backend implements.
    pub fn supported_native_operations(&self) -> Vec<&'static str> {
        self.dispatcher.supported_native_operations()
    }

    /// The evaluation order, resolving it if the cache is stale.
    pub fn order(&mut self) -> DagResult<&[NodeIndex]> {
        if self.order.is_none() {
            self.order = Some(resolver::resolve(&self.store)?);
        }
        Ok(self.order.as_deref().unwrap_or_default())
    }

    /// Evaluate every calc node and return the result node's value.
    ///
    /// Operations run on the native backend when it supports them, unless
    /// `force_fallback` is set.
    pub fn execute(&mut self, force_fallback: bool) -> DagResult<Option<String>> {
        let _span =
            tracing::debug_span!("execute", nodes = self.store.len(), force_fallback).entered();

        if self.order.is_none() {
            match resolver::resolve(&self.store) {
                Ok(order) => self.order = Some(order),
                Err(err) => {
                    tracing::warn!(cycle = ?err.cycle, "nodes in the graph have a cycle");
                    return Err(err.into());
                }
            }
        }
        let order = self.order.as_deref().unwrap_or_default();

        if let Some(&missing) = order.iter().find(|&&index| !self.store.contains(index)) {
            tracing::warn!(index = missing, "node is undefined");
            return Err(DagError::UndefinedNode(missing));
        }

        for &index in order {
            let Some(Node::Calc {
                operation,
                children,
                ..
            }) = self.store.get(index)
            else {
                continue;
            };

            let args = children
                .iter()
                .map(|&child| {
                    self.store
                        .get(child)
                        .and_then(Node::value)
                        .ok_or(DagError::UndefinedNode(child))
                })
                .collect::<DagResult<Vec<&str>>>()?;

            let value = self
                .dispatcher
                .dispatch(index, operation, &args, force_fallback)
                .map_err(|source| {
                    tracing::warn!(index, error = %source, "node execution failed");
                    DagError::NodeEvaluationFailed { index, source }
                })?;
            tracing::trace!(index, %value, "node evaluated");

            if let Some(node) = self.store.get_mut(index) {
                node.set_value(value);
            }
        }

        Ok(self
            .result
            .and_then(|index| self.store.get(index))
            .and_then(Node::value)
            .map(str::to_owned))
    }

    fn invalidate(&mut self) {
        self.order = None;
    }

    /// Swap the node store, dropping the cached order and the result.
    pub(crate) fn replace_store(&mut self, store: NodeStore) -> NodeStore {
        self.result = None;
        self.invalidate();
        std::mem::replace(&mut self.store, store)
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  DAG INFO")?;
        writeln!(f, "-------------")?;
        writeln!(
            f,
            "Native backend supports: {}",
            self.supported_native_operations().join(", ")
        )?;
        writeln!(f, "Nodes: {}", self.store.len())?;
        for (index, node) in self.store.iter() {
            writeln!(f, "{index}: {node}")?;
        }
        match self.result {
            Some(index) => write!(
                f,
                "result: node {index}, value: {:?}",
                self.store.get(index).and_then(Node::value)
            ),
            None => write!(f, "result: none"),
        }
    }
}
