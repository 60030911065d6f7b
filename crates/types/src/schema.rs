//! Provider schemas: an identifier plus an ordered list of fields.

use std::{collections::HashSet, fmt};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FieldKind, FieldSpec, validate_field_value};

/// Declarative description of one provider type's configurable fields.
///
/// Implementations must return the same identifier and the same field sequence
/// on every call for the lifetime of the instance; the host uses the identifier
/// as a lookup key and controllers index panel state by field name.
pub trait Schema: fmt::Debug {
    /// Stable provider type key (for example `swarm`).
    fn identifier(&self) -> &str;

    /// Fields in display order.
    fn fields(&self) -> &[FieldSpec];

    /// Optional human-readable title for the provider type.
    fn title(&self) -> Option<&str> {
        None
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().iter().find(|field| field.name == name)
    }
}

/// Errors raised when a schema violates its structural invariants.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("schema identifier must not be empty")]
    MissingIdentifier,

    #[error("schema '{identifier}' declares no fields")]
    Empty { identifier: String },

    #[error("schema '{identifier}' declares field '{field}' more than once")]
    DuplicateField { identifier: String, field: String },

    #[error("schema '{identifier}' declares a field without a name")]
    UnnamedField { identifier: String },

    #[error("enum field '{field}' in schema '{identifier}' declares no choices")]
    MissingChoices { identifier: String, field: String },

    #[error("pattern for field '{field}' in schema '{identifier}' does not compile: {message}")]
    InvalidPattern {
        identifier: String,
        field: String,
        message: String,
    },

    #[error("default for field '{field}' in schema '{identifier}' is invalid: {message}")]
    InvalidDefault {
        identifier: String,
        field: String,
        message: String,
    },

    #[error("schema document could not be parsed: {0}")]
    Parse(String),
}

/// Schema built from data, either in code or from a YAML/JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSchema {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ProviderSchema {
    /// Builds a schema and checks its invariants.
    pub fn new(identifier: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let schema = Self {
            identifier: identifier.into(),
            title: None,
            fields,
        };
        schema.check_invariants()?;
        Ok(schema)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parses a YAML (or JSON) schema document and checks its invariants.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_yaml::from_str(text).map_err(|error| SchemaError::Parse(error.to_string()))?;
        schema.check_invariants()?;
        Ok(schema)
    }

    pub fn check_invariants(&self) -> Result<(), SchemaError> {
        if self.identifier.trim().is_empty() {
            return Err(SchemaError::MissingIdentifier);
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Empty {
                identifier: self.identifier.clone(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::UnnamedField {
                    identifier: self.identifier.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    identifier: self.identifier.clone(),
                    field: field.name.clone(),
                });
            }
            if field.kind == FieldKind::Enum && field.choices.is_empty() {
                return Err(SchemaError::MissingChoices {
                    identifier: self.identifier.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(pattern) = &field.rules.pattern
                && let Err(error) = Regex::new(pattern)
            {
                return Err(SchemaError::InvalidPattern {
                    identifier: self.identifier.clone(),
                    field: field.name.clone(),
                    message: error.to_string(),
                });
            }
            if let Some(default) = &field.default
                && let Err(message) = validate_field_value(default, field)
            {
                return Err(SchemaError::InvalidDefault {
                    identifier: self.identifier.clone(),
                    field: field.name.clone(),
                    message,
                });
            }
        }
        Ok(())
    }
}

impl Schema for ProviderSchema {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_stable_across_calls() {
        let schema = ProviderSchema::new("demo", vec![FieldSpec::string("name").required(), FieldSpec::number("replicas")])
            .expect("valid schema");
        let first: Vec<_> = schema.fields().iter().map(|field| field.name.clone()).collect();
        let second: Vec<_> = schema.fields().iter().map(|field| field.name.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["name", "replicas"]);
        assert_eq!(schema.fields(), schema.fields());
    }

    #[test]
    fn rejects_patterns_that_do_not_compile() {
        let error = ProviderSchema::from_yaml_str("identifier: demo\nfields:\n  - name: image\n    rules:\n      pattern: \"[\"\n")
            .unwrap_err();
        assert!(matches!(error, SchemaError::InvalidPattern { ref field, .. } if field == "image"));

        let error = ProviderSchema::new("demo", vec![FieldSpec::string("image").with_pattern("(unclosed")]).unwrap_err();
        assert!(matches!(error, SchemaError::InvalidPattern { ref identifier, .. } if identifier == "demo"));
    }

    #[test]
    fn rejects_empty_schema() {
        assert_eq!(
            ProviderSchema::new("demo", Vec::new()),
            Err(SchemaError::Empty { identifier: "demo".into() })
        );
    }

    #[test]
    fn rejects_blank_identifier() {
        assert_eq!(
            ProviderSchema::new("  ", vec![FieldSpec::string("name")]),
            Err(SchemaError::MissingIdentifier)
        );
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let error = ProviderSchema::new("demo", vec![FieldSpec::string("name"), FieldSpec::number("name")]).unwrap_err();
        assert_eq!(
            error,
            SchemaError::DuplicateField {
                identifier: "demo".into(),
                field: "name".into()
            }
        );
    }

    #[test]
    fn rejects_enum_without_choices() {
        let field = FieldSpec::new("mode", FieldKind::Enum);
        let error = ProviderSchema::new("demo", vec![field]).unwrap_err();
        assert!(matches!(error, SchemaError::MissingChoices { .. }));
    }

    #[test]
    fn rejects_default_that_breaks_its_own_rules() {
        let field = FieldSpec::number("replicas").with_range(Some(1.0), None).with_default(0);
        let error = ProviderSchema::new("demo", vec![field]).unwrap_err();
        assert!(matches!(error, SchemaError::InvalidDefault { ref field, .. } if field == "replicas"));
    }

    #[test]
    fn parses_yaml_document() {
        let yaml_text = r#"
identifier: nomad
title: Nomad cluster
fields:
  - name: address
    type: string
    required: true
    rules:
      pattern: "^https?://"
  - name: datacenters
    type: list
  - name: region
    type: enum
    enum: [global, eu]
    default: global
"#;
        let schema = ProviderSchema::from_yaml_str(yaml_text).expect("parse schema");
        assert_eq!(schema.identifier(), "nomad");
        assert_eq!(schema.title(), Some("Nomad cluster"));
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.field("datacenters").map(|field| field.kind), Some(FieldKind::List));
        assert!(schema.field("address").is_some_and(|field| field.required));
    }

    #[test]
    fn yaml_document_is_checked() {
        let yaml_text = "identifier: nomad\nfields: []\n";
        assert!(matches!(ProviderSchema::from_yaml_str(yaml_text), Err(SchemaError::Empty { .. })));
        assert!(matches!(ProviderSchema::from_yaml_str("fields: ["), Err(SchemaError::Parse(_))));
    }
}
