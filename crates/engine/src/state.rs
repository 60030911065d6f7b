//! Panel state, the render snapshot handed to hosts, and committed output.

use chrono::{DateTime, Utc};
use cloudpanel_types::{FieldKind, FieldOutcome, FieldSpec, Schema, ValidationResult, is_empty_value};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

const SECRET_MASK: &str = "********";

/// Current field values of one panel, keyed by field name.
///
/// Keys are always field names of the bound schema; empty values are not stored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PanelState {
    values: IndexMap<String, Value>,
}

impl PanelState {
    /// Seeds state from initial values, falling back to each field's default.
    ///
    /// Callers must have checked that every initial key names a schema field.
    pub(crate) fn seed(schema: &dyn Schema, initial_values: Option<&IndexMap<String, Value>>) -> Self {
        let mut values = IndexMap::new();
        for field in schema.fields() {
            let explicit = initial_values
                .and_then(|initial| initial.get(&field.name))
                .filter(|value| !is_empty_value(value));
            if let Some(value) = explicit.or(field.default.as_ref()) {
                values.insert(field.name.clone(), value.clone());
            }
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) {
        if is_empty_value(&value) {
            self.values.shift_remove(name);
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    /// Non-empty values ordered as the schema declares its fields.
    pub(crate) fn ordered_values(&self, schema: &dyn Schema) -> IndexMap<String, Value> {
        schema
            .fields()
            .iter()
            .filter_map(|field| self.values.get(&field.name).map(|value| (field.name.clone(), value.clone())))
            .collect()
    }
}

/// Display status of a single field row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Valid,
    Empty,
    Missing,
    Invalid,
}

impl From<&FieldOutcome> for FieldStatus {
    fn from(outcome: &FieldOutcome) -> Self {
        match outcome {
            FieldOutcome::Valid => Self::Valid,
            FieldOutcome::Empty => Self::Empty,
            FieldOutcome::Missing => Self::Missing,
            FieldOutcome::Invalid(_) => Self::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub status: FieldStatus,
    /// Inline validation message.
    pub message: Option<String>,
    /// Rendered value, masked for secret fields.
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub description: Option<String>,
}

/// Snapshot of a panel that a host renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub identifier: String,
    pub title: Option<String>,
    pub read_only: bool,
    /// Aggregate verdict: whether the panel may be submitted.
    pub valid: bool,
    pub rows: Vec<FieldRow>,
}

impl PanelView {
    pub(crate) fn build(schema: &dyn Schema, state: &PanelState, validation: &ValidationResult, read_only: bool) -> Self {
        let rows = schema
            .fields()
            .iter()
            .map(|field| build_row(field, state.get(&field.name), validation.outcome(&field.name)))
            .collect();
        Self {
            identifier: schema.identifier().to_string(),
            title: schema.title().map(str::to_string),
            read_only,
            valid: validation.is_valid(),
            rows,
        }
    }

    pub fn row(&self, name: &str) -> Option<&FieldRow> {
        self.rows.iter().find(|row| row.name == name)
    }
}

fn build_row(field: &FieldSpec, value: Option<&Value>, outcome: Option<&FieldOutcome>) -> FieldRow {
    let outcome = outcome
        .cloned()
        .unwrap_or_else(|| FieldOutcome::evaluate(field, value));
    FieldRow {
        name: field.name.clone(),
        label: field.display_label().into_owned(),
        kind: field.kind,
        required: field.required,
        status: FieldStatus::from(&outcome),
        message: outcome.message().map(str::to_string),
        value: value.map(|value| format_preview(value, field.secret)),
        placeholder: field.placeholder.clone(),
        description: field.description.clone(),
    }
}

/// Renders a value for display, masking secrets.
pub fn format_preview(value: &Value, secret: bool) -> String {
    if secret {
        return SECRET_MASK.to_string();
    }
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| format_preview(item, false))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Configuration produced by a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommittedConfig {
    /// Provider type the configuration belongs to.
    pub identifier: String,
    /// Non-empty values in schema order.
    pub values: IndexMap<String, Value>,
    pub committed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpanel_types::ProviderSchema;
    use serde_json::json;

    fn schema() -> ProviderSchema {
        ProviderSchema::new(
            "demo",
            vec![
                FieldSpec::string("name").required(),
                FieldSpec::number("replicas").required().with_default(1),
                FieldSpec::string("token").secret(),
                FieldSpec::list("labels"),
            ],
        )
        .expect("valid schema")
    }

    #[test]
    fn explicit_initial_value_wins_over_default() {
        let schema = schema();
        let initial = IndexMap::from([("replicas".to_string(), json!(3))]);
        let state = PanelState::seed(&schema, Some(&initial));
        assert_eq!(state.get("replicas"), Some(&json!(3)));
        assert_eq!(state.get("name"), None);
    }

    #[test]
    fn default_fills_fields_without_initial_value() {
        let schema = schema();
        let initial = IndexMap::from([("replicas".to_string(), Value::Null)]);
        let state = PanelState::seed(&schema, Some(&initial));
        assert_eq!(state.get("replicas"), Some(&json!(1)));
        assert_eq!(PanelState::seed(&schema, None).get("replicas"), Some(&json!(1)));
    }

    #[test]
    fn empty_values_are_not_stored() {
        let schema = schema();
        let mut state = PanelState::seed(&schema, None);
        state.set("name", json!("swarm-1"));
        state.set("name", json!(""));
        assert_eq!(state.get("name"), None);
    }

    #[test]
    fn ordered_values_follow_schema_order() {
        let schema = schema();
        let mut state = PanelState::default();
        state.set("labels", json!(["a=b"]));
        state.set("name", json!("swarm-1"));
        let keys: Vec<_> = state.ordered_values(&schema).keys().cloned().collect();
        assert_eq!(keys, vec!["name", "labels"]);
    }

    #[test]
    fn view_masks_secrets_and_reports_inline_messages() {
        let schema = schema();
        let mut state = PanelState::seed(&schema, None);
        state.set("token", json!("s3cr3t"));
        state.set("labels", json!(["a=b", "c=d"]));
        let validation = ValidationResult::evaluate(&schema, state.values());
        let view = PanelView::build(&schema, &state, &validation, false);

        assert!(!view.valid);
        let name = view.row("name").expect("name row");
        assert_eq!(name.status, FieldStatus::Missing);
        assert_eq!(name.message.as_deref(), Some("a value is required"));
        assert_eq!(view.row("token").and_then(|row| row.value.as_deref()), Some(SECRET_MASK));
        assert_eq!(view.row("labels").and_then(|row| row.value.as_deref()), Some("a=b, c=d"));
        assert_eq!(view.row("replicas").map(|row| row.status), Some(FieldStatus::Valid));
    }
}
