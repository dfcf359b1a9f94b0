//! Strgraph Core
//!
//! This crate provides the core engine for evaluating graphs of string
//! operations. It implements:
//!
//! - A DAG of constant and computed string nodes
//! - Dependency ordering with cycle and undefined-node detection
//! - Operation dispatch over a native and a fallback backend
//! - A tracer that turns a Rust closure into an equivalent graph
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Node storage, dependency resolution and execution
//! - `ops`: String operation backends and the dispatcher
//! - `trace`: Building graphs from closures over symbolic handles
//! - `error`: Error types shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use strgraph_core::Dag;
//!
//! let mut dag = Dag::new();
//! dag.set_const(0, "aaaa");
//! dag.set_const(1, "aaa");
//! dag.set_const(2, "bbb");
//! dag.set_calc(3, "replace", &[0, 1, 2], false).unwrap();
//! dag.set_const(4, "123");
//! dag.set_calc(5, "concat", &[3, 4], true).unwrap();
//!
//! assert_eq!(dag.execute(false).unwrap().as_deref(), Some("bbba123"));
//! assert_eq!(dag.values()[&3].as_deref(), Some("bbba"));
//! ```

pub mod error;
pub mod graph;
pub mod ops;
pub mod trace;

#[cfg(feature = "python")]
mod python;

pub use error::{CycleDetected, DagError, DagResult, DispatchError, OpError};
pub use graph::{ChildRef, Dag, Node, NodeIndex, NodeKind};
pub use ops::{supported_native_operations, Backend, Dispatcher, FallbackBackend, NativeBackend};
pub use trace::{Handle, TraceFn, TraceOutput};
