//! Graph Nodes
//!
//! This module defines the node types that live in the DAG.

use std::fmt;

use smallvec::SmallVec;

/// Identifier of a node within one DAG.
///
/// Indices are chosen by the caller, or by the store when a node is created
/// implicitly (tracer inputs, literal children).
pub type NodeIndex = usize;

/// Child list of a calc node. Most operations take at most three arguments.
pub type Children = SmallVec<[NodeIndex; 4]>;

/// The kind of node in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A constant string. These are the leaves of the graph.
    Const,

    /// A value computed from the children's values during execution.
    Calc,
}

/// A node in the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A fixed string with no dependencies.
    Const { value: String },

    /// A string computed by applying `operation` to the children's values.
    ///
    /// `value` is `None` until the node has been evaluated.
    Calc {
        operation: String,
        children: Children,
        value: Option<String>,
    },
}

impl Node {
    /// Create a new constant node.
    pub fn constant(value: impl Into<String>) -> Self {
        Node::Const {
            value: value.into(),
        }
    }

    /// Create a new, unevaluated calc node.
    pub fn calc(operation: impl Into<String>, children: impl IntoIterator<Item = NodeIndex>) -> Self {
        Node::Calc {
            operation: operation.into(),
            children: children.into_iter().collect(),
            value: None,
        }
    }

    /// Get the node's kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Const { .. } => NodeKind::Const,
            Node::Calc { .. } => NodeKind::Calc,
        }
    }

    /// Get the current value. Always present for constants.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Const { value } => Some(value),
            Node::Calc { value, .. } => value.as_deref(),
        }
    }

    /// Get the children. Constants have none.
    pub fn children(&self) -> &[NodeIndex] {
        match self {
            Node::Const { .. } => &[],
            Node::Calc { children, .. } => children,
        }
    }

    /// Get the operation name of a calc node.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Node::Const { .. } => None,
            Node::Calc { operation, .. } => Some(operation),
        }
    }

    /// Store the result of evaluating a calc node. No-op on constants.
    pub(crate) fn set_value(&mut self, result: String) {
        if let Node::Calc { value, .. } = self {
            *value = Some(result);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Const { value } => write!(f, "CONST: {value:?}"),
            Node::Calc {
                operation,
                children,
                value,
            } => write!(
                f,
                "CALC: operation: {operation}, children: {:?}, value: {value:?}",
                children.as_slice()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_node_has_value_and_no_children() {
        let node = Node::constant("abc");
        assert_eq!(node.kind(), NodeKind::Const);
        assert_eq!(node.value(), Some("abc"));
        assert!(node.children().is_empty());
        assert!(node.operation().is_none());
    }

    #[test]
    fn calc_node_starts_unevaluated() {
        let node = Node::calc("replace", [0, 1, 2]);
        assert_eq!(node.kind(), NodeKind::Calc);
        assert_eq!(node.value(), None);
        assert_eq!(node.children(), &[0, 1, 2]);
        assert_eq!(node.operation(), Some("replace"));
    }

    #[test]
    fn set_value_only_touches_calc_nodes() {
        let mut calc = Node::calc("upper", [0]);
        calc.set_value("ABC".into());
        assert_eq!(calc.value(), Some("ABC"));

        let mut constant = Node::constant("abc");
        constant.set_value("xyz".into());
        assert_eq!(constant.value(), Some("abc"));
    }

    #[test]
    fn display_matches_info_format() {
        assert_eq!(Node::constant("a").to_string(), "CONST: \"a\"");

        let mut calc = Node::calc("concat", [0, 1]);
        assert_eq!(
            calc.to_string(),
            "CALC: operation: concat, children: [0, 1], value: None"
        );
        calc.set_value("ab".into());
        assert_eq!(
            calc.to_string(),
            "CALC: operation: concat, children: [0, 1], value: Some(\"ab\")"
        );
    }
}
