//! Field-level and panel-level validation.
//!
//! These routines are shared by the controller (inline feedback on every edit),
//! schema construction (defaults must satisfy their own field), and the CLI.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::{FieldKind, FieldRules, FieldSpec, Schema};

/// Validate a JSON candidate against a field's kind, choices, rules and custom validator.
///
/// The checks run in that order and stop at the first failure:
/// - The JSON shape must match the field kind.
/// - Declared choices must include the candidate.
/// - Patterns and length limits apply to strings, and to each string item of a list.
/// - Numeric ranges apply to numbers, item counts to lists.
pub fn validate_field_value(candidate: &Value, field: &FieldSpec) -> Result<(), String> {
    check_kind(candidate, field.kind)?;

    if !field.choices.is_empty() && !field.choices.iter().any(|allowed| json_values_match(allowed, candidate)) {
        return Err("value is not in the allowed set".to_string());
    }

    match candidate {
        Value::String(text) => check_text(text, &field.rules)?,
        Value::Number(number) => {
            let number = number.as_f64().ok_or_else(|| "value is not a finite number".to_string())?;
            if let Some(minimum) = field.rules.minimum
                && number < minimum
            {
                return Err(format!("value must be at least {}", minimum));
            }
            if let Some(maximum) = field.rules.maximum
                && number > maximum
            {
                return Err(format!("value must be at most {}", maximum));
            }
        }
        Value::Array(items) => {
            if let Some(min_items) = field.rules.min_items
                && items.len() < min_items
            {
                return Err(format!("list must contain at least {} items", min_items));
            }
            if let Some(max_items) = field.rules.max_items
                && items.len() > max_items
            {
                return Err(format!("list must contain at most {} items", max_items));
            }
            if field.rules.has_text_rules() {
                for item in items {
                    match item {
                        Value::String(text) => check_text(text, &field.rules).map_err(|message| format!("item '{}': {}", text, message))?,
                        other => return Err(format!("item {} must be text to satisfy validation rules", other)),
                    }
                }
            }
        }
        _ => {}
    }

    if let Some(validator) = &field.validator {
        validator.check(candidate)?;
    }
    Ok(())
}

/// Returns true for values that count as "not filled in": null, blank text, empty lists.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_kind(candidate: &Value, kind: FieldKind) -> Result<(), String> {
    let matches_kind = match kind {
        FieldKind::String => candidate.is_string(),
        FieldKind::Number => candidate.is_number(),
        FieldKind::Boolean => candidate.is_boolean(),
        FieldKind::Enum => candidate.is_string() || candidate.is_number() || candidate.is_boolean(),
        FieldKind::List => candidate.is_array(),
    };
    if matches_kind {
        Ok(())
    } else {
        Err(match kind {
            FieldKind::String => "value must be text".to_string(),
            FieldKind::Number => "value must be a number".to_string(),
            FieldKind::Boolean => "value must be true or false".to_string(),
            FieldKind::Enum => "value must be one of the listed choices".to_string(),
            FieldKind::List => "value must be a list".to_string(),
        })
    }
}

fn check_text(text: &str, rules: &FieldRules) -> Result<(), String> {
    if let Some(min_length) = rules.min_length
        && text.chars().count() < min_length
    {
        return Err(format!("value must be at least {} characters", min_length));
    }

    if let Some(max_length) = rules.max_length
        && text.chars().count() > max_length
    {
        return Err(format!("value must be at most {} characters", max_length));
    }

    if let Some(pattern) = &rules.pattern {
        let regex = Regex::new(pattern).map_err(|error| format!("invalid pattern '{}': {}", pattern, error))?;
        if !regex.is_match(text) {
            return Err(format!("value must match the pattern {}", pattern));
        }
    }
    Ok(())
}

fn json_values_match(expected: &Value, candidate: &Value) -> bool {
    if expected == candidate {
        return true;
    }
    match (expected, candidate) {
        (Value::String(expected_text), other) => expected_text == &other.to_string(),
        (other, Value::String(candidate_text)) => {
            if let Ok(parsed) = serde_json::from_str::<Value>(candidate_text) {
                other == &parsed
            } else {
                false
            }
        }
        _ => false,
    }
}

/// Outcome of validating a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// The field holds a value that passed every check.
    Valid,
    /// Optional field left empty.
    Empty,
    /// Required field left empty.
    Missing,
    /// The field holds a value that failed a check.
    Invalid(String),
}

impl FieldOutcome {
    /// Evaluates a field given its current value, if any.
    pub fn evaluate(field: &FieldSpec, value: Option<&Value>) -> Self {
        match value {
            Some(value) if !is_empty_value(value) => match validate_field_value(value, field) {
                Ok(()) => Self::Valid,
                Err(message) => Self::Invalid(message),
            },
            _ if field.required => Self::Missing,
            _ => Self::Empty,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid | Self::Empty)
    }

    /// Inline message shown next to the field, if the outcome blocks submission.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Invalid(message) => Some(message),
            Self::Missing => Some("a value is required"),
            Self::Valid | Self::Empty => None,
        }
    }
}

/// Per-field outcomes plus the aggregate panel verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    fields: IndexMap<String, FieldOutcome>,
}

impl ValidationResult {
    /// Validates every field of the schema against the given values.
    pub fn evaluate(schema: &dyn Schema, values: &IndexMap<String, Value>) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|field| (field.name.clone(), FieldOutcome::evaluate(field, values.get(&field.name))))
            .collect();
        Self { fields }
    }

    /// Replaces the outcome of one field, keeping its position.
    pub fn record(&mut self, name: impl Into<String>, outcome: FieldOutcome) {
        self.fields.insert(name.into(), outcome);
    }

    pub fn outcome(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields.get(name)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.fields.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// Valid when every required field is valid and no optional field holds an invalid value.
    pub fn is_valid(&self) -> bool {
        self.fields.values().all(FieldOutcome::is_valid)
    }

    /// Fields blocking submission with their inline messages, in schema order.
    pub fn failures(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, outcome)| outcome.message().map(|message| (name.clone(), message.to_string())))
            .collect()
    }
}
