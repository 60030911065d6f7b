//! Field descriptors that make up a provider schema.
//!
//! A [`FieldSpec`] is pure data: how the field is labelled, what kind of value it
//! holds, whether it must be filled in, its default, and the declarative rules a
//! candidate value must obey. Code-defined schemas may additionally attach a
//! [`FieldValidator`] predicate; declarative (YAML/JSON) schemas cannot.

use std::{borrow::Cow, fmt, sync::Arc};

use heck::ToTitleCase;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Primitive kind of value a field holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-form text.
    #[default]
    String,
    /// Integer or floating point number.
    Number,
    /// Checkbox style true/false.
    Boolean,
    /// One value out of the field's declared choices.
    Enum,
    /// Ordered list of values.
    List,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::List => "list",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative constraints attached to a field.
///
/// Text rules apply to string values and to every string item of a list value.
/// Range rules apply to numbers, item-count rules to lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldRules {
    /// Regular expression the text must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Minimum length in characters.
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Inclusive lower bound for numbers.
    #[serde(default)]
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numbers.
    #[serde(default)]
    pub maximum: Option<f64>,
    /// Minimum number of list items.
    #[serde(default)]
    pub min_items: Option<usize>,
    /// Maximum number of list items.
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl FieldRules {
    pub fn has_text_rules(&self) -> bool {
        self.pattern.is_some() || self.min_length.is_some() || self.max_length.is_some()
    }
}

type ValidatorFn = dyn Fn(&JsonValue) -> Result<(), String> + Send + Sync;

/// Custom predicate run after the declarative rules have passed.
#[derive(Clone)]
pub struct FieldValidator {
    check: Arc<ValidatorFn>,
}

impl FieldValidator {
    pub fn new(check: impl Fn(&JsonValue) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self { check: Arc::new(check) }
    }

    /// Runs the predicate against a candidate value.
    pub fn check(&self, candidate: &JsonValue) -> Result<(), String> {
        (self.check)(candidate)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldValidator(..)")
    }
}

impl PartialEq for FieldValidator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.check, &other.check)
    }
}

/// One configurable field of a provider schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// Unique key within the schema; also the key used in panel state.
    pub name: String,
    /// Human-readable label. Derived from `name` when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Kind of value the field holds.
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Whether the panel may only be submitted once this field holds a valid value.
    #[serde(default)]
    pub required: bool,
    /// Value used when the host supplies no initial value.
    #[serde(default)]
    pub default: Option<JsonValue>,
    /// Allowed values, mandatory for `enum` fields.
    #[serde(rename = "enum", default)]
    pub choices: Vec<JsonValue>,
    /// Declarative validation rules.
    #[serde(default)]
    pub rules: FieldRules,
    /// Help text shown next to the field.
    #[serde(default)]
    pub description: Option<String>,
    /// Placeholder rendered while the field is empty.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// When set, values are masked in views and command output.
    #[serde(default)]
    pub secret: bool,
    #[serde(skip)]
    pub validator: Option<FieldValidator>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            required: false,
            default: None,
            choices: Vec::new(),
            rules: FieldRules::default(),
            description: None,
            placeholder: None,
            secret: false,
            validator: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    /// Builds an `enum` field accepting exactly the given choices.
    pub fn enumeration<I, V>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let mut field = Self::new(name, FieldKind::Enum);
        field.choices = choices.into_iter().map(Into::into).collect();
        field
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rules.pattern = Some(pattern.into());
        self
    }

    pub fn with_length(mut self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        self.rules.min_length = min_length;
        self.rules.max_length = max_length;
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.rules.minimum = minimum;
        self.rules.maximum = maximum;
        self
    }

    pub fn with_items(mut self, min_items: Option<usize>, max_items: Option<usize>) -> Self {
        self.rules.min_items = min_items;
        self.rules.max_items = max_items;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Label shown to users, falling back to a title-cased field name.
    pub fn display_label(&self) -> Cow<'_, str> {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => Cow::Borrowed(label),
            _ => Cow::Owned(self.name.to_title_case()),
        }
    }
}
