//! Function Tracing
//!
//! Builds a DAG by running an ordinary Rust closure over symbolic handles.
//!
//! # How Tracing Works
//!
//! 1. Each input value becomes a constant node, and the closure receives one
//!    [`Handle`] per input.
//! 2. Every operation called on a handle records a new calc node and returns
//!    a handle to it. `+` and `+=` record `concat`.
//! 3. Literal operands become new constant nodes on the spot.
//! 4. The handle the closure returns becomes the result node.
//!
//! The closure runs exactly once. Loops are unrolled into one node per
//! iteration, and conditionals follow the branch taken for the given inputs,
//! so the graph is a straight-line record of that single run.
//!
//! # Example
//!
//! ```
//! use strgraph_core::{Dag, Handle};
//!
//! let mut dag = Dag::new();
//! dag.trace(&["hello ", "world "], |mut s1: Handle, s2: Handle| {
//!     for _ in 0..2 {
//!         s1 += &s2;
//!     }
//!     s1.replace("o", "0")
//! })
//! .unwrap();
//!
//! assert_eq!(dag.execute(false).unwrap().as_deref(), Some("hell0 w0rld w0rld "));
//! ```

mod handle;

pub use handle::Handle;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{DagError, DagResult};
use crate::graph::{Dag, NodeStore};

/// What a traced closure returned.
///
/// Only a handle is a valid trace result. The other conversions exist so
/// that closures returning something else are reported instead of rejected
/// at compile time with an unhelpful trait error.
#[derive(Debug)]
pub enum TraceOutput {
    Handle(Handle),
    Other(&'static str),
}

impl From<Handle> for TraceOutput {
    fn from(handle: Handle) -> Self {
        TraceOutput::Handle(handle)
    }
}

impl From<Option<Handle>> for TraceOutput {
    fn from(handle: Option<Handle>) -> Self {
        handle.map_or(TraceOutput::Other("None"), TraceOutput::Handle)
    }
}

impl From<()> for TraceOutput {
    fn from(_: ()) -> Self {
        TraceOutput::Other("()")
    }
}

impl From<&str> for TraceOutput {
    fn from(_: &str) -> Self {
        TraceOutput::Other("str")
    }
}

impl From<String> for TraceOutput {
    fn from(_: String) -> Self {
        TraceOutput::Other("str")
    }
}

macro_rules! other_output {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl From<$ty> for TraceOutput {
                fn from(_: $ty) -> Self {
                    TraceOutput::Other($name)
                }
            }
        )*
    };
}

other_output!(i32 => "int", i64 => "int", usize => "int", bool => "bool");

/// A closure that can be traced.
///
/// Implemented for closures taking zero to six [`Handle`]s. `Args` only
/// tells the implementations apart.
pub trait TraceFn<Args> {
    /// Number of handles the closure takes.
    fn arity(&self) -> usize;

    /// Run the closure. Returns `None` if `inputs` has the wrong length.
    fn invoke(self, inputs: Vec<Handle>) -> Option<TraceOutput>;
}

macro_rules! impl_trace_fn {
    ($n:literal; $($arg:ident),+) => {
        impl<F, R> TraceFn<[Handle; $n]> for F
        where
            F: FnOnce($(impl_trace_fn!(@handle $arg)),+) -> R,
            R: Into<TraceOutput>,
        {
            fn arity(&self) -> usize {
                $n
            }

            fn invoke(self, inputs: Vec<Handle>) -> Option<TraceOutput> {
                let [$($arg),+]: [Handle; $n] = inputs.try_into().ok()?;
                Some(self($($arg),+).into())
            }
        }
    };
    (@handle $arg:ident) => {
        Handle
    };
}

impl<F, R> TraceFn<[Handle; 0]> for F
where
    F: FnOnce() -> R,
    R: Into<TraceOutput>,
{
    fn arity(&self) -> usize {
        0
    }

    fn invoke(self, inputs: Vec<Handle>) -> Option<TraceOutput> {
        inputs.is_empty().then(|| self().into())
    }
}

impl_trace_fn!(1; a);
impl_trace_fn!(2; a, b);
impl_trace_fn!(3; a, b, c);
impl_trace_fn!(4; a, b, c, d);
impl_trace_fn!(5; a, b, c, d, e);
impl_trace_fn!(6; a, b, c, d, e, g);

impl Dag {
    /// Replace the graph with a trace of `f` run on `inputs`.
    ///
    /// The number of inputs must match the number of parameters of `f`;
    /// this is checked before the graph is reset. If `f` returns anything
    /// other than a handle the traced nodes are kept, no result is
    /// designated, and [`DagError::TraceReturnType`] is returned.
    pub fn trace<F, Args>(&mut self, inputs: &[&str], f: F) -> DagResult<()>
    where
        F: TraceFn<Args>,
    {
        if f.arity() != inputs.len() {
            return Err(DagError::InvalidArgument(format!(
                "function takes {} parameter(s) but {} input value(s) were given",
                f.arity(),
                inputs.len()
            )));
        }

        let store = Rc::new(RefCell::new(NodeStore::new()));
        let handles = inputs
            .iter()
            .map(|value| Handle::input(&store, value))
            .collect();

        let output = f.invoke(handles).ok_or_else(|| {
            DagError::InvalidArgument("input count does not match the function".into())
        })?;

        self.replace_store(store.replace(NodeStore::new()));
        tracing::debug!(nodes = self.len(), "traced function into graph");

        match output {
            TraceOutput::Handle(handle) => self.set_result(Some(handle.index())),
            TraceOutput::Other(found) => {
                tracing::warn!(found, "traced function did not return a node handle");
                Err(DagError::TraceReturnType { found })
            }
        }
    }
}
