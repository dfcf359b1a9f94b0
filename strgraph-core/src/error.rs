//! Error Types
//!
//! Errors are layered the same way evaluation is:
//!
//! - [`OpError`] is what a backend reports for a single operation call. It
//!   knows nothing about the graph.
//! - [`DispatchError`] is what the dispatcher reports. It attaches the
//!   operation name and the index of the node being evaluated.
//! - [`DagError`] is what the public DAG API returns. Dispatch failures are
//!   wrapped in [`DagError::NodeEvaluationFailed`] so callers can identify
//!   the failing node without looking at backend internals.

use thiserror::Error;

use crate::graph::NodeIndex;
use crate::ops::Arity;

/// Errors raised by a backend while running one operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// The backend has no operation with this name.
    #[error("operation `{operation}` is not supported")]
    Unsupported { operation: String },

    /// The operation exists but was called with the wrong number of arguments.
    #[error("operation `{operation}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        operation: String,
        expected: Arity,
        found: usize,
    },

    /// The operation rejected its arguments (e.g. an empty separator).
    #[error("operation `{operation}` failed: {reason}")]
    Failed { operation: String, reason: String },
}

/// Errors raised by the dispatcher for the node being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("node {index}: operation `{operation}` failed")]
    OperationFailed {
        operation: String,
        index: NodeIndex,
        #[source]
        source: OpError,
    },

    /// A backend produced something other than a string.
    #[error("node {index}: operation `{operation}` produced {found}, expected str")]
    InvalidResultType {
        operation: String,
        index: NodeIndex,
        found: &'static str,
    },
}

/// Raised by the resolver when the declared children contain a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("nodes {cycle:?} form a cycle")]
pub struct CycleDetected {
    /// The nodes of one cycle, each a child of the one before it.
    pub cycle: Vec<NodeIndex>,
}

/// Errors returned by the DAG API.
#[derive(Debug, Error)]
pub enum DagError {
    /// Bad caller input, detected before the graph is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `delete` was asked to remove an index that holds no node.
    #[error("node {0} does not exist")]
    NotFound(NodeIndex),

    #[error("nodes in the graph have a cycle: {cycle:?}")]
    GraphHasCycle { cycle: Vec<NodeIndex> },

    /// A calc node references a child index that holds no node.
    #[error("node {0} is undefined")]
    UndefinedNode(NodeIndex),

    #[error("node {index} execution failed")]
    NodeEvaluationFailed {
        index: NodeIndex,
        #[source]
        source: DispatchError,
    },

    /// A traced function returned something other than a node handle.
    #[error("traced function returned {found}, expected a node handle")]
    TraceReturnType { found: &'static str },
}

impl From<CycleDetected> for DagError {
    fn from(err: CycleDetected) -> Self {
        DagError::GraphHasCycle { cycle: err.cycle }
    }
}

/// Result type for DAG operations.
pub type DagResult<T> = Result<T, DagError>;
