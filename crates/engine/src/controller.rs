//! Generic controller binding one schema to one UI placement.
//!
//! The controller owns the panel state for its whole lifetime: it seeds the
//! state on attach, re-validates a field on every edit, recomputes the
//! aggregate verdict, asks the host to redraw, and commits through the host on
//! submission. Dropping or detaching it unmounts the panel.

use std::{
    rc::{Rc, Weak},
    sync::Arc,
};

use chrono::Utc;
use cloudpanel_types::{FieldOutcome, FieldSpec, Schema, ValidationResult, coerce_text};
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value};
use tracing::{debug, info, warn};

use crate::{CommittedConfig, HostHandle, PanelError, PanelHost, PanelParams, PanelState, PanelView, Placement};

#[derive(Debug)]
pub struct Controller {
    schema: Arc<dyn Schema>,
    placement: Placement,
    host: Weak<dyn PanelHost>,
    host_options: JsonMap<String, Value>,
    read_only: bool,
    state: PanelState,
    validation: ValidationResult,
    last_commit: Option<CommittedConfig>,
    released: bool,
}

impl Controller {
    /// Binds `schema` to `placement` and renders the initial panel.
    ///
    /// # Errors
    ///
    /// - [`PanelError::SchemaMismatch`] when `params.initial_values` names a field
    ///   the schema does not declare. Nothing is rendered in that case.
    /// - [`PanelError::InvalidPlacement`] when the host cannot resolve the placement.
    pub fn attach(host: &HostHandle, placement: Placement, params: PanelParams, schema: Arc<dyn Schema>) -> Result<Self, PanelError> {
        let PanelParams {
            initial_values,
            read_only,
            host_options,
        } = params;

        if let Some(initial) = &initial_values {
            let unknown: Vec<String> = initial.keys().filter(|name| schema.field(name).is_none()).cloned().collect();
            if !unknown.is_empty() {
                warn!(
                    provider = schema.identifier(),
                    unknown = ?unknown,
                    "initial values reference fields outside the schema"
                );
                return Err(PanelError::SchemaMismatch {
                    identifier: schema.identifier().to_string(),
                    fields: unknown,
                });
            }
        }

        if !host.resolve(&placement) {
            return Err(PanelError::InvalidPlacement { placement });
        }

        let state = PanelState::seed(schema.as_ref(), initial_values.as_ref());
        let validation = ValidationResult::evaluate(schema.as_ref(), state.values());
        let controller = Self {
            schema,
            placement,
            host: Rc::downgrade(host),
            host_options,
            read_only,
            state,
            validation,
            last_commit: None,
            released: false,
        };
        host.render(&controller.placement, &controller.view());
        info!(
            provider = controller.schema.identifier(),
            placement = %controller.placement,
            read_only,
            valid = controller.validation.is_valid(),
            "panel attached"
        );
        Ok(controller)
    }

    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    pub fn identifier(&self) -> &str {
        self.schema.identifier()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Host-defined options that arrived with the attach parameters.
    pub fn host_options(&self) -> &JsonMap<String, Value> {
        &self.host_options
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        self.state.values()
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn last_commit(&self) -> Option<&CommittedConfig> {
        self.last_commit.as_ref()
    }

    pub fn view(&self) -> PanelView {
        PanelView::build(self.schema.as_ref(), &self.state, &self.validation, self.read_only)
    }

    /// Replaces a field's value and returns its fresh outcome.
    ///
    /// Invalid values are kept so the panel can show them with an inline message.
    pub fn edit(&mut self, name: &str, value: Value) -> Result<FieldOutcome, PanelError> {
        self.apply_edit(name, value, None)
    }

    /// Coerces raw text according to the field kind, then edits.
    ///
    /// Text that cannot be coerced is stored verbatim and reported invalid.
    pub fn edit_text(&mut self, name: &str, text: &str) -> Result<FieldOutcome, PanelError> {
        let kind = self.field(name)?.kind;
        match coerce_text(text, kind) {
            Ok(value) => self.apply_edit(name, value, None),
            Err(message) => self.apply_edit(name, Value::String(text.to_string()), Some(message)),
        }
    }

    /// Empties a field.
    pub fn clear(&mut self, name: &str) -> Result<FieldOutcome, PanelError> {
        self.apply_edit(name, Value::Null, None)
    }

    /// Commits the panel through the host when the aggregate verdict is valid.
    ///
    /// # Errors
    ///
    /// [`PanelError::Validation`] names every field blocking submission, in
    /// schema order. [`PanelError::Commit`] wraps a host persistence failure.
    pub fn submit(&mut self) -> Result<CommittedConfig, PanelError> {
        let host = self.live_host()?;
        self.ensure_writable()?;

        if !self.validation.is_valid() {
            let invalid = self.validation.failures();
            let blocking: Vec<&String> = invalid.keys().collect();
            debug!(provider = self.identifier(), blocking = ?blocking, "submission blocked");
            return Err(PanelError::Validation {
                identifier: self.identifier().to_string(),
                invalid,
            });
        }

        let config = CommittedConfig {
            identifier: self.identifier().to_string(),
            values: self.state.ordered_values(self.schema.as_ref()),
            committed_at: Utc::now(),
        };
        host.commit(&config).map_err(|source| PanelError::Commit {
            identifier: config.identifier.clone(),
            source,
        })?;
        info!(
            provider = %config.identifier,
            placement = %self.placement,
            field_count = config.values.len(),
            "panel committed"
        );
        self.last_commit = Some(config.clone());
        Ok(config)
    }

    /// Unmounts the panel and discards its state.
    pub fn detach(mut self) {
        self.release();
    }

    fn apply_edit(&mut self, name: &str, value: Value, coercion_error: Option<String>) -> Result<FieldOutcome, PanelError> {
        let host = self.live_host()?;
        self.ensure_writable()?;
        let schema = Arc::clone(&self.schema);
        let field = schema
            .field(name)
            .ok_or_else(|| PanelError::unknown_field(schema.identifier(), name))?;

        self.state.set(name, value);
        let outcome = match coercion_error {
            Some(message) => FieldOutcome::Invalid(message),
            None => FieldOutcome::evaluate(field, self.state.get(name)),
        };
        self.validation.record(name, outcome.clone());
        debug!(
            provider = schema.identifier(),
            field = name,
            outcome = ?outcome,
            panel_valid = self.validation.is_valid(),
            "field edited"
        );
        host.render(&self.placement, &self.view());
        Ok(outcome)
    }

    fn field(&self, name: &str) -> Result<&FieldSpec, PanelError> {
        self.schema
            .field(name)
            .ok_or_else(|| PanelError::unknown_field(self.schema.identifier(), name))
    }

    fn live_host(&self) -> Result<Rc<dyn PanelHost>, PanelError> {
        self.host.upgrade().ok_or_else(|| PanelError::Detached {
            identifier: self.identifier().to_string(),
        })
    }

    fn ensure_writable(&self) -> Result<(), PanelError> {
        if self.read_only {
            return Err(PanelError::ReadOnly {
                identifier: self.identifier().to_string(),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(host) = self.host.upgrade() {
            host.unmount(&self.placement);
        }
        self.state = PanelState::default();
        self.validation = ValidationResult::default();
        info!(provider = self.schema.identifier(), placement = %self.placement, "panel detached");
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.release();
    }
}
