//! String Operations
//!
//! This module maps `(operation name, string arguments)` to a result string.
//!
//! # Architecture
//!
//! Operations are provided by two backends behind one [`Backend`] trait:
//!
//! 1. The native backend implements a small closed set of operations
//!    (`concat`, `lower`, `upper`, `replace`).
//! 2. The fallback backend implements the generic string member operations
//!    as an explicit registry of pure functions, and can be extended at
//!    build time with [`FallbackBackend::register`].
//!
//! The [`Dispatcher`] prefers the native backend for every operation it
//! supports and uses the fallback for everything else. Both backends give
//! identical results for the operations they share, so the choice never
//! shows up in the output.

mod fallback;
mod native;

pub use fallback::FallbackBackend;
pub use native::{supported_native_operations, NativeBackend};

use std::fmt;

use indexmap::IndexMap;

use crate::error::{DispatchError, OpError};
use crate::graph::NodeIndex;

/// Number of arguments an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Check whether `count` arguments are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// The value an operation produced.
///
/// Only [`Output::Str`] is a valid node value. The other variants exist
/// because generic string members such as `count` or `split` do not return
/// strings, and the dispatcher has to reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl Output {
    /// Name of the produced type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Output::Str(_) => "str",
            Output::Int(_) => "int",
            Output::Bool(_) => "bool",
            Output::List(_) => "list",
        }
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Output::Str(value)
    }
}

/// A registered operation. Arguments are arity-checked before the call;
/// an `Err` carries the reason the arguments were rejected.
pub type OpFn = fn(&[&str]) -> Result<Output, String>;

#[derive(Clone, Copy)]
struct OpEntry {
    arity: Arity,
    func: OpFn,
}

/// A name-keyed table of string operations.
#[derive(Clone, Default)]
pub struct OpRegistry {
    ops: IndexMap<&'static str, OpEntry>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation, replacing any previous one with the same name.
    pub fn register(&mut self, name: &'static str, arity: Arity, func: OpFn) -> &mut Self {
        self.ops.insert(name, OpEntry { arity, func });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.ops.get(name).map(|entry| entry.arity)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.ops.keys().copied().collect()
    }

    /// Look up `name`, check the argument count and run it.
    pub fn call(&self, name: &str, args: &[&str]) -> Result<Output, OpError> {
        let entry = self.ops.get(name).ok_or_else(|| OpError::Unsupported {
            operation: name.to_owned(),
        })?;

        if !entry.arity.accepts(args.len()) {
            return Err(OpError::ArityMismatch {
                operation: name.to_owned(),
                expected: entry.arity,
                found: args.len(),
            });
        }

        (entry.func)(args).map_err(|reason| OpError::Failed {
            operation: name.to_owned(),
            reason,
        })
    }
}

impl fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ops.keys()).finish()
    }
}

/// A provider of string operations.
pub trait Backend: Send + Sync {
    /// Name shown in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Every operation this backend implements.
    fn operations(&self) -> Vec<&'static str>;

    fn supports(&self, operation: &str) -> bool;

    /// Run `operation` on `args`.
    fn invoke(&self, operation: &str, args: &[&str]) -> Result<Output, OpError>;
}

/// Chooses a backend for each operation and invokes it.
pub struct Dispatcher {
    native: Box<dyn Backend>,
    fallback: Box<dyn Backend>,
}

impl Dispatcher {
    /// Create a dispatcher from explicit backends.
    pub fn new(native: impl Backend + 'static, fallback: impl Backend + 'static) -> Self {
        Self {
            native: Box::new(native),
            fallback: Box::new(fallback),
        }
    }

    /// Operations the native backend implements.
    pub fn supported_native_operations(&self) -> Vec<&'static str> {
        self.native.operations()
    }

    /// Pick the backend that runs `operation`.
    ///
    /// The native backend wins unless execution is forced onto the fallback
    /// or the native backend does not know the operation.
    pub fn select(&self, operation: &str, force_fallback: bool) -> &dyn Backend {
        if !force_fallback && self.native.supports(operation) {
            self.native.as_ref()
        } else {
            self.fallback.as_ref()
        }
    }

    /// Run `operation` for the node at `index`.
    pub fn dispatch(
        &self,
        index: NodeIndex,
        operation: &str,
        args: &[&str],
        force_fallback: bool,
    ) -> Result<String, DispatchError> {
        let backend = self.select(operation, force_fallback);
        tracing::debug!(index, operation, backend = backend.name(), ?args, "dispatching");

        let output = backend
            .invoke(operation, args)
            .map_err(|source| DispatchError::OperationFailed {
                operation: operation.to_owned(),
                index,
                source,
            })?;

        match output {
            Output::Str(value) => Ok(value),
            other => Err(DispatchError::InvalidResultType {
                operation: operation.to_owned(),
                index,
                found: other.type_name(),
            }),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(NativeBackend::new(), FallbackBackend::new())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("native", &self.native.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
