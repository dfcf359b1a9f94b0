//! Node Store
//!
//! The store owns every node of a DAG, keyed by index. It keeps insertion
//! order so that value snapshots and resolution order are reproducible.
//!
//! # Index Assignment
//!
//! Callers normally pick indices explicitly. When the store has to create a
//! node on its own (a literal child, a tracer input) it takes the smallest
//! unused index that is not below the current node count.
//!
//! Creating a calc node can create further constant nodes for its literal
//! children. The target index is reserved before those children are created,
//! so an auto-assigned child can never land on the parent's slot.

use indexmap::IndexMap;

use super::node::{Children, Node, NodeIndex};

/// A reference to a child as supplied by a caller.
///
/// Literals are normalized into fresh constant nodes when the parent is
/// inserted, so stored nodes only ever refer to indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    Index(NodeIndex),
    Literal(String),
}

impl From<NodeIndex> for ChildRef {
    fn from(index: NodeIndex) -> Self {
        ChildRef::Index(index)
    }
}

impl From<&str> for ChildRef {
    fn from(value: &str) -> Self {
        ChildRef::Literal(value.to_owned())
    }
}

impl From<String> for ChildRef {
    fn from(value: String) -> Self {
        ChildRef::Literal(value)
    }
}

/// A node description that has not been inserted yet.
#[derive(Debug, Clone)]
pub enum NewNode {
    Const(String),
    Calc {
        operation: String,
        children: Vec<ChildRef>,
    },
}

#[derive(Debug, Clone)]
enum Slot {
    /// Index taken by a node whose children are still being created.
    Reserved,
    Filled(Node),
}

/// Owns all nodes of a DAG by index.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    slots: IndexMap<NodeIndex, Slot>,
}

impl NodeStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, overwriting whatever was at `index`.
    ///
    /// With `index == None` the store picks the next free index. Returns the
    /// index the node was stored at.
    pub fn insert(&mut self, index: Option<NodeIndex>, node: NewNode) -> NodeIndex {
        let index = index.unwrap_or_else(|| self.next_free_index());
        self.slots.insert(index, Slot::Reserved);

        let node = match node {
            NewNode::Const(value) => Node::Const { value },
            NewNode::Calc {
                operation,
                children,
            } => {
                let children: Children = children
                    .into_iter()
                    .map(|child| self.resolve_child(child))
                    .collect();
                Node::Calc {
                    operation,
                    children,
                    value: None,
                }
            }
        };

        self.slots.insert(index, Slot::Filled(node));
        index
    }

    fn resolve_child(&mut self, child: ChildRef) -> NodeIndex {
        match child {
            ChildRef::Index(index) => index,
            ChildRef::Literal(value) => self.insert(None, NewNode::Const(value)),
        }
    }

    /// Smallest unused index that is not below the current node count.
    pub fn next_free_index(&self) -> NodeIndex {
        let mut index = self.slots.len();
        while self.slots.contains_key(&index) {
            index += 1;
        }
        index
    }

    /// Remove a node, returning it if it existed.
    ///
    /// Later nodes keep their relative order.
    pub fn remove(&mut self, index: NodeIndex) -> Option<Node> {
        match self.slots.shift_remove(&index)? {
            Slot::Filled(node) => Some(node),
            Slot::Reserved => None,
        }
    }

    /// Get a reference to a node.
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        match self.slots.get(&index)? {
            Slot::Filled(node) => Some(node),
            Slot::Reserved => None,
        }
    }

    /// Get a mutable reference to a node.
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        match self.slots.get_mut(&index)? {
            Slot::Filled(node) => Some(node),
            Slot::Reserved => None,
        }
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        self.get(index).is_some()
    }

    /// Iterate over nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.slots.iter().filter_map(|(&index, slot)| match slot {
            Slot::Filled(node) => Some((index, node)),
            Slot::Reserved => None,
        })
    }

    /// Snapshot of every node's current value, in insertion order.
    pub fn values(&self) -> IndexMap<NodeIndex, Option<String>> {
        self.iter()
            .map(|(index, node)| (index, node.value().map(str::to_owned)))
            .collect()
    }

    /// Get the total number of nodes in the store.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
