//! Diff options
use crate::errors::DiffError;
use serde::{Deserialize, Serialize};

/// What to do when siblings share a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// The first sibling keeps the key; later ones are reconciled as unkeyed.
    #[default]
    FirstWins,
    /// Fail the diff with `DiffError::DuplicateKey`.
    Reject,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl DiffOptions {
    pub fn from_json_str(source: &str) -> Result<Self, DiffError> {
        serde_json::from_str(source).map_err(|e| DiffError::InvalidOptions {
            details: e.to_string(),
        })
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DiffError> {
        serde_json::from_value(value).map_err(|e| DiffError::InvalidOptions {
            details: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(DiffOptions::from_json_str("{}").unwrap(), DiffOptions::default());
    }

    #[test]
    fn parses_reject_policy() {
        let options = DiffOptions::from_json_str(r#"{"duplicate_keys": "reject"}"#).unwrap();
        assert_eq!(options.duplicate_keys, DuplicateKeyPolicy::Reject);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DiffOptions::from_json_str(r#"{"duplicate_key": "reject"}"#).unwrap_err();
        assert!(matches!(err, DiffError::InvalidOptions { .. }));
    }
}
