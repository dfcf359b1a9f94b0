//! String Computation Graph
//!
//! This module implements the DAG of string computations.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph where:
//!
//! - Nodes are either constant strings or calc nodes that apply a named
//!   operation to the values of their children
//! - Edges point from a calc node to its children, in argument order
//!
//! Executing the graph evaluates every calc node after all of its children,
//! so each operation sees fully computed arguments.
//!
//! # Design Decisions
//!
//! 1. Nodes live in one store keyed by integer index. Children are indices,
//!    never references, so the graph can be edited freely between runs.
//!
//! 2. The evaluation order is cached and only recomputed after a mutation.
//!
//! 3. Cycles and dangling children are not prevented at insertion time.
//!    They are reported when the graph is executed, before any node runs.

mod dag;
mod node;
mod resolver;
mod store;

pub use dag::Dag;
pub use node::{Children, Node, NodeIndex, NodeKind};
pub use resolver::{resolve, DependencyGraph};
pub use store::{ChildRef, NewNode, NodeStore};
