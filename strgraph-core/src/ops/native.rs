//! Native Backend
//!
//! The fixed set of operations with a dedicated implementation. Each one
//! takes string arguments and returns a string; that is the whole contract
//! between the dispatcher and this backend.

use super::{Arity, Backend, OpFn, OpRegistry, Output};
use crate::error::OpError;

/// Registration list of the native operations.
const OPERATIONS: &[(&str, Arity, OpFn)] = &[
    ("concat", Arity::exactly(2), concat),
    ("lower", Arity::exactly(1), lower),
    ("upper", Arity::exactly(1), upper),
    ("replace", Arity::exactly(3), replace),
];

fn concat(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Str([args[0], args[1]].concat()))
}

fn lower(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Str(args[0].to_lowercase()))
}

fn upper(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Str(args[0].to_uppercase()))
}

fn replace(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Str(args[0].replace(args[1], args[2])))
}

/// Names of every native operation.
pub fn supported_native_operations() -> Vec<&'static str> {
    OPERATIONS.iter().map(|(name, _, _)| *name).collect()
}

/// The native operation backend.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    registry: OpRegistry,
}

impl NativeBackend {
    pub fn new() -> Self {
        let mut registry = OpRegistry::new();
        for &(name, arity, func) in OPERATIONS {
            registry.register(name, arity, func);
        }
        Self { registry }
    }

    /// Run a native operation.
    pub fn call(&self, operation: &str, args: &[&str]) -> Result<String, OpError> {
        match self.registry.call(operation, args)? {
            Output::Str(value) => Ok(value),
            other => Err(OpError::Failed {
                operation: operation.to_owned(),
                reason: format!("native operation returned {}", other.type_name()),
            }),
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn operations(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    fn supports(&self, operation: &str) -> bool {
        self.registry.contains(operation)
    }

    fn invoke(&self, operation: &str, args: &[&str]) -> Result<Output, OpError> {
        self.call(operation, args).map(Output::Str)
    }
}
