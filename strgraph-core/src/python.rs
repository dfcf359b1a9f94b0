//! Python Bindings
//!
//! Exposes [`Dag`] to Python as `DAG`, with the method names the Python
//! package has always used.

use std::error::Error as _;

use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::DagError;
use crate::graph::Dag;
use crate::ops::supported_native_operations;

/// Convert a DAG error into a Python exception, keeping the cause chain in
/// the message.
fn to_py_err(err: DagError) -> PyErr {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    match err {
        DagError::InvalidArgument(_) | DagError::TraceReturnType { .. } => {
            PyTypeError::new_err(message)
        }
        DagError::NotFound(_) => PyKeyError::new_err(message),
        _ => PyRuntimeError::new_err(message),
    }
}

/// Python-exposed DAG.
#[pyclass(name = "DAG")]
pub struct PyDag {
    dag: Dag,
}

#[pymethods]
impl PyDag {
    #[new]
    fn new() -> Self {
        Self { dag: Dag::new() }
    }

    /// Operations implemented by the native backend.
    #[staticmethod]
    fn get_supported_operations() -> Vec<&'static str> {
        supported_native_operations()
    }

    fn set_const_node(&mut self, index: usize, value: String) {
        self.dag.set_const(index, value);
    }

    #[pyo3(signature = (index, operation, children, is_result = false))]
    fn set_calc_node(
        &mut self,
        index: usize,
        operation: &str,
        children: Vec<usize>,
        is_result: bool,
    ) -> PyResult<()> {
        self.dag
            .set_calc(index, operation, &children, is_result)
            .map_err(to_py_err)
    }

    fn delete_node(&mut self, index: usize) -> PyResult<()> {
        self.dag.delete(index).map_err(to_py_err)
    }

    /// Map of node index to value, `None` for unevaluated nodes.
    fn get_nodes_values(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new_bound(py);
        for (index, value) in self.dag.values() {
            dict.set_item(index, value)?;
        }
        Ok(dict.unbind())
    }

    #[pyo3(signature = (force_python_engine = false))]
    fn execute(&mut self, force_python_engine: bool) -> PyResult<Option<String>> {
        self.dag.execute(force_python_engine).map_err(to_py_err)
    }

    fn info(&self) -> String {
        self.dag.to_string()
    }

    fn __str__(&self) -> String {
        self.info()
    }

    fn __repr__(&self) -> String {
        format!(
            "DAG(nodes={}, result={:?})",
            self.dag.len(),
            self.dag.result()
        )
    }
}

/// Python module definition.
///
/// This function is called by Python when importing the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDag>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
