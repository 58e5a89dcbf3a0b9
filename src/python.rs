//! Python bindings for the CIF parser using PyO3.
//!
//! Grounded in the teacher's `crates/cif-parser/src/python.rs` (the
//! `#[pyclass]`/`#[pymethods]` shape, `CifError` -> `PyErr` conversion) but
//! trimmed, like `wasm.rs`, to the operations this crate's model supports.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::document::Cif;
use crate::error::CifError;
use crate::options::{CifVersion, WriteOptions};
use crate::value::Value;

fn cif_error_to_py_err(err: CifError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Python wrapper for `CifVersion`.
#[pyclass(name = "Version", eq, eq_int)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PyVersion {
    V1_1 = 0,
    V2_0 = 1,
}

#[pymethods]
impl PyVersion {
    fn __str__(&self) -> &'static str {
        match self {
            PyVersion::V1_1 => "CIF 1.1",
            PyVersion::V2_0 => "CIF 2.0",
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Version.{}",
            match self {
                PyVersion::V1_1 => "V1_1",
                PyVersion::V2_0 => "V2_0",
            }
        )
    }
}

impl From<CifVersion> for PyVersion {
    fn from(v: CifVersion) -> Self {
        match v {
            CifVersion::V1_1 => PyVersion::V1_1,
            CifVersion::V2_0 => PyVersion::V2_0,
        }
    }
}

impl From<PyVersion> for CifVersion {
    fn from(v: PyVersion) -> Self {
        match v {
            PyVersion::V1_1 => CifVersion::V1_1,
            PyVersion::V2_0 => CifVersion::V2_0,
        }
    }
}

/// Python wrapper for a single CIF value, converted into native Python types
/// at access time rather than kept as a boxed Rust enum on the Python side.
fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<Py<PyAny>> {
    match value {
        Value::Char(s) => Ok(pyo3::types::PyString::new(py, s).into_any().unbind()),
        Value::Numb(n) => Ok(n.approx().into_pyobject(py)?.into_any().unbind()),
        Value::Na => Ok(py.None()),
        Value::Unk => Ok(py.None()),
        Value::List(items) => {
            let py_list: Vec<Py<PyAny>> = items
                .iter()
                .map(|v| value_to_py(py, v))
                .collect::<PyResult<Vec<_>>>()?;
            Ok(py_list.into_pyobject(py)?.into_any().unbind())
        }
        Value::Table(t) => {
            let py_dict = pyo3::types::PyDict::new(py);
            for (k, v) in t.iter() {
                py_dict.set_item(k, value_to_py(py, v)?)?;
            }
            Ok(py_dict.into_any().unbind())
        }
    }
}

/// A parsed CIF document.
#[pyclass(name = "Cif")]
pub struct PyCif {
    inner: Cif,
}

#[pymethods]
impl PyCif {
    /// Parse a CIF string with default options.
    #[staticmethod]
    fn parse(text: &str) -> PyResult<Self> {
        Cif::parse_str(text)
            .map(|inner| PyCif { inner })
            .map_err(cif_error_to_py_err)
    }

    /// Serialize back to CIF 2.0 text.
    fn to_string(&self) -> PyResult<String> {
        self.inner.to_string_cif().map_err(cif_error_to_py_err)
    }

    /// Serialize with explicit version control.
    fn serialize(&self, version: PyVersion) -> PyResult<String> {
        let opts = WriteOptions {
            version: version.into(),
            ..WriteOptions::default()
        };
        crate::writer::write_to_string(&self.inner, &opts).map_err(cif_error_to_py_err)
    }

    #[getter]
    fn block_codes(&self) -> Vec<String> {
        self.inner.blocks().iter().map(|b| b.code().to_string()).collect()
    }

    fn get_scalar(&self, py: Python<'_>, block_code: &str, item_name: &str) -> PyResult<Py<PyAny>> {
        let value = self
            .inner
            .find_block(block_code)
            .and_then(|b| b.items().get_scalar(item_name));
        match value {
            Some(v) => value_to_py(py, v),
            None => Ok(py.None()),
        }
    }

    fn loop_names(&self, block_code: &str) -> Option<Vec<Vec<String>>> {
        let b = self.inner.find_block(block_code)?;
        Some(
            b.items()
                .loops()
                .iter()
                .filter(|l| !l.is_scalars())
                .map(|l| l.names().to_vec())
                .collect(),
        )
    }
}

/// The `cif_parser` Python module.
#[pymodule]
fn _cif_parser(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCif>()?;
    m.add_class::<PyVersion>()?;
    Ok(())
}
