//! Python <-> JSON conversion, going through the `json` module on the Python side
use crate::errors::DiffError;
use pyo3::prelude::*;
use pyo3::types::PyModule;

/// Serialize a Python object with `json.dumps` and parse it back as JSON.
pub fn python_to_json<'py>(
    py: Python<'py>,
    obj: &Bound<'py, PyAny>,
) -> Result<serde_json::Value, DiffError> {
    let json_mod = PyModule::import(py, "json")?;
    let dumped = json_mod.getattr("dumps")?.call1((obj,))?;
    let source: String = dumped.extract()?;
    serde_json::from_str(&source).map_err(|e| DiffError::InvalidNode {
        path: "/".to_string(),
        reason: format!("not JSON-serializable: {}", e),
    })
}

/// Optional argument: Python `None` and a missing value both mean JSON `null`.
pub fn optional_to_json<'py>(
    py: Python<'py>,
    obj: Option<&Bound<'py, PyAny>>,
) -> Result<serde_json::Value, DiffError> {
    match obj {
        Some(obj) if !obj.is_none() => python_to_json(py, obj),
        _ => Ok(serde_json::Value::Null),
    }
}

/// Inverse of [`python_to_json`]: serialize with `serde_json` and rebuild with `json.loads`.
pub fn json_to_pyobject<'py>(
    py: Python<'py>,
    value: &serde_json::Value,
) -> Result<Bound<'py, PyAny>, DiffError> {
    let source = serde_json::to_string(value)?;
    let json_mod = PyModule::import(py, "json")?;
    Ok(json_mod.getattr("loads")?.call1((source,))?)
}
