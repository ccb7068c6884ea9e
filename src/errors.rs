// /src/errors.rs
//! Diff failures. Every variant aborts the whole `diff` call; no partial script is returned.
use thiserror::Error;

/// Boxed error raised by a thunk's render closure.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Invalid node at '{path}': {reason}")]
    InvalidNode { path: String, reason: String },

    #[error("Thunk did not return a valid node (got a nested thunk)")]
    InvalidThunkResult,

    #[error("Thunk render failed: {0}")]
    ThunkRender(#[source] RenderError),

    #[error("Duplicate sibling key '{key}'")]
    DuplicateKey { key: String },

    #[error("Invalid diff options: {details}")]
    InvalidOptions { details: String },

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[cfg(feature = "python")]
    #[error("Python call failed: {0}")]
    PythonError(String),
}

impl DiffError {
    pub(crate) fn invalid_node(path: &str, reason: impl Into<String>) -> Self {
        DiffError::InvalidNode {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "python")]
impl From<DiffError> for pyo3::PyErr {
    fn from(err: DiffError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for DiffError {
    fn from(err: pyo3::PyErr) -> Self {
        DiffError::PythonError(err.to_string())
    }
}
