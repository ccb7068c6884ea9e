//! Python module: diff JSON-shaped trees given as dicts, lists and strings
use crate::config::DiffOptions;
use crate::converters::{json_to_pyobject, optional_to_json, python_to_json};
use crate::json::diff_json;
use crate::patch::PatchKind;
use log::debug;
use pyo3::prelude::*;
use pyo3::types::PyDict;

#[pyclass]
pub struct Differ {
    options: DiffOptions,
}

#[pymethods]
impl Differ {
    #[new]
    #[pyo3(signature = (options=None))]
    fn new(py: Python<'_>, options: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let options = parse_options(py, options)?;
        debug!("Differ: initialized with {:?}", options);
        Ok(Differ { options })
    }

    /// Returns `{"root": ..., "patches": {index: [op, ...]}}`.
    fn diff<'py>(
        &self,
        py: Python<'py>,
        old: Option<&Bound<'py, PyAny>>,
        new: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        diff_objects(py, old, new, self.options)
    }
}

fn parse_options(py: Python<'_>, options: Option<&Bound<'_, PyDict>>) -> PyResult<DiffOptions> {
    match options {
        Some(dict) => Ok(DiffOptions::from_json_value(python_to_json(py, dict.as_any())?)?),
        None => Ok(DiffOptions::default()),
    }
}

fn diff_objects<'py>(
    py: Python<'py>,
    old: Option<&Bound<'py, PyAny>>,
    new: Option<&Bound<'py, PyAny>>,
    options: DiffOptions,
) -> PyResult<Bound<'py, PyAny>> {
    let old = optional_to_json(py, old)?;
    let new = optional_to_json(py, new)?;
    let script = diff_json(&old, &new, options)?;
    Ok(json_to_pyobject(py, &script)?)
}

#[pyfunction]
#[pyo3(name = "diff", signature = (old, new, options=None))]
fn diff_py<'py>(
    py: Python<'py>,
    old: Option<&Bound<'py, PyAny>>,
    new: Option<&Bound<'py, PyAny>>,
    options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyAny>> {
    let options = parse_options(py, options)?;
    diff_objects(py, old, new, options)
}

#[pymodule]
fn vtree_diff(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Differ>()?;
    m.add_function(wrap_pyfunction!(diff_py, m)?)?;

    // Patch kind names mapped to their wire codes
    for kind in PatchKind::ALL {
        m.add(kind.as_str(), kind.code())?;
    }

    Ok(())
}
