//! Error types surfaced by panel controllers and the provider registry.

use cloudpanel_types::SchemaError;
use cloudpanel_util::StoreError;
use indexmap::IndexMap;
use thiserror::Error;

use crate::placement::{Placement, TabbedPaneHandle};

/// Main error type for panel operations.
///
/// The registration entry points never wrap or recover these; whatever the
/// schema or controller reports reaches the host unchanged.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Initial values name fields the schema does not declare.
    #[error("initial values for '{identifier}' reference unknown fields: {}", .fields.join(", "))]
    SchemaMismatch { identifier: String, fields: Vec<String> },

    /// The host could not resolve the placement to a live container.
    #[error("placement {placement} does not resolve to a live container")]
    InvalidPlacement { placement: Placement },

    /// Submission blocked by invalid or missing fields, keyed by field name.
    #[error("configuration for '{identifier}' is invalid: {}", describe_failures(.invalid))]
    Validation {
        identifier: String,
        invalid: IndexMap<String, String>,
    },

    #[error("field '{field}' is not part of schema '{identifier}'")]
    UnknownField { identifier: String, field: String },

    #[error("panel for '{identifier}' is read-only")]
    ReadOnly { identifier: String },

    /// The host that owned the panel is gone.
    #[error("panel for '{identifier}' is no longer attached to a host")]
    Detached { identifier: String },

    #[error("host rejected configuration for '{identifier}': {source}")]
    Commit {
        identifier: String,
        #[source]
        source: CommitError,
    },

    #[error("no panel is attached to {pane}")]
    NoPanel { pane: TabbedPaneHandle },

    #[error("provider '{identifier}' is not registered")]
    UnknownProvider { identifier: String },

    #[error("provider '{identifier}' is already registered")]
    DuplicateProvider { identifier: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PanelError {
    pub fn unknown_field(identifier: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            identifier: identifier.into(),
            field: field.into(),
        }
    }

    pub fn unknown_provider(identifier: impl Into<String>) -> Self {
        Self::UnknownProvider {
            identifier: identifier.into(),
        }
    }

    /// Names of the fields that blocked submission, when this is a validation error.
    pub fn invalid_fields(&self) -> Option<Vec<&str>> {
        match self {
            Self::Validation { invalid, .. } => Some(invalid.keys().map(String::as_str).collect()),
            _ => None,
        }
    }
}

/// Failure reported by a host while persisting committed configuration.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommitError {
    message: String,
}

impl CommitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<StoreError> for CommitError {
    fn from(error: StoreError) -> Self {
        Self::new(error.to_string())
    }
}

fn describe_failures(invalid: &IndexMap<String, String>) -> String {
    invalid
        .iter()
        .map(|(field, message)| format!("{} ({})", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_each_field() {
        let error = PanelError::Validation {
            identifier: "swarm".into(),
            invalid: IndexMap::from([
                ("name".to_string(), "a value is required".to_string()),
                ("replicas".to_string(), "value must be at least 1".to_string()),
            ]),
        };
        assert_eq!(
            error.to_string(),
            "configuration for 'swarm' is invalid: name (a value is required), replicas (value must be at least 1)"
        );
        assert_eq!(error.invalid_fields(), Some(vec!["name", "replicas"]));
    }

    #[test]
    fn schema_mismatch_names_unknown_keys() {
        let error = PanelError::SchemaMismatch {
            identifier: "swarm".into(),
            fields: vec!["unknownField".into()],
        };
        assert_eq!(error.to_string(), "initial values for 'swarm' reference unknown fields: unknownField");
        assert!(error.invalid_fields().is_none());
    }
}
