//! Shared schema definitions for CloudPanel provider panels.
//!
//! A provider type is described by a [`Schema`]: a stable identifier plus an
//! ordered list of [`FieldSpec`]s. The controller in `cloudpanel-engine` binds a
//! schema to a UI placement and uses the validation helpers defined here to give
//! inline feedback and to decide whether a panel may be submitted.

pub mod coerce;
pub mod field;
pub mod schema;
pub mod validation;

pub use coerce::coerce_text;
pub use field::{FieldKind, FieldRules, FieldSpec, FieldValidator};
pub use schema::{ProviderSchema, Schema, SchemaError};
pub use validation::{FieldOutcome, ValidationResult, is_empty_value, validate_field_value};
