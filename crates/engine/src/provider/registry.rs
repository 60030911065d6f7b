use std::sync::Arc;

use cloudpanel_types::{ProviderSchema, Schema};
use indexmap::IndexMap;
use tracing::{debug, info};

use super::{DeclaredProvider, ProviderModule};
use crate::{HostHandle, OptionsHandle, PanelError, PanelParams, TabbedPaneHandle};

/// Explicit table of provider modules keyed by provider identifier.
///
/// The table is built once at startup and passed to whoever instantiates
/// panels; there is no process-wide registry.
#[derive(Default)]
pub struct ProviderRegistry {
    modules: IndexMap<String, Box<dyn ProviderModule>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider module. Identifiers must be unique.
    pub fn register(&mut self, module: impl ProviderModule + 'static) -> Result<(), PanelError> {
        let identifier = module.identifier().to_string();
        if self.modules.contains_key(&identifier) {
            return Err(PanelError::DuplicateProvider { identifier });
        }
        debug!(provider = %identifier, title = module.title(), "provider registered");
        self.modules.insert(identifier, Box::new(module));
        Ok(())
    }

    /// Adds a provider described by a declarative schema.
    pub fn register_schema(&mut self, schema: ProviderSchema) -> Result<(), PanelError> {
        self.register(DeclaredProvider::new(schema)?)
    }

    /// Registered `(identifier, title)` pairs in registration order.
    pub fn providers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(identifier, module)| (identifier.as_str(), module.title()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.modules.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&dyn ProviderModule> {
        self.modules.get(identifier).map(|module| &**module)
    }

    /// Builds a fresh schema for a provider, for inspection outside a panel.
    pub fn describe(&self, identifier: &str) -> Result<Arc<dyn Schema>, PanelError> {
        let module = self.module(identifier)?;
        Ok(module.schema()?)
    }

    /// Runs a provider's registration entry point.
    pub fn init(
        &self,
        identifier: &str,
        host: &HostHandle,
        options: &OptionsHandle,
        tabbed_pane: &TabbedPaneHandle,
        params: PanelParams,
    ) -> Result<(), PanelError> {
        let module = self.module(identifier)?;
        info!(provider = identifier, pane = %tabbed_pane, "initializing provider panel");
        module.init(host, options, tabbed_pane, params)
    }

    fn module(&self, identifier: &str) -> Result<&dyn ProviderModule, PanelError> {
        self.get(identifier).ok_or_else(|| PanelError::unknown_provider(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpanel_types::FieldSpec;

    fn nomad_schema() -> ProviderSchema {
        ProviderSchema::new("nomad", vec![FieldSpec::string("address").required()])
            .expect("valid schema")
            .with_title("Nomad cluster")
    }

    #[test]
    fn lists_providers_in_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register_schema(nomad_schema()).expect("register nomad");
        registry
            .register_schema(ProviderSchema::new("k8s", vec![FieldSpec::string("context")]).expect("valid schema"))
            .expect("register k8s");

        let providers: Vec<_> = registry.providers().collect();
        assert_eq!(providers, vec![("nomad", "Nomad cluster"), ("k8s", "k8s")]);
        assert!(registry.contains("k8s"));
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let mut registry = ProviderRegistry::new();
        registry.register_schema(nomad_schema()).expect("register nomad");
        let error = registry.register_schema(nomad_schema()).unwrap_err();
        assert!(matches!(error, PanelError::DuplicateProvider { ref identifier } if identifier == "nomad"));
    }

    #[test]
    fn unknown_provider_is_reported() {
        let registry = ProviderRegistry::new();
        assert!(matches!(registry.describe("swarm"), Err(PanelError::UnknownProvider { .. })));
    }

    #[test]
    fn schema_lookup_builds_fresh_instances() {
        let mut registry = ProviderRegistry::new();
        registry.register_schema(nomad_schema()).expect("register nomad");
        let schema = registry.describe("nomad").expect("schema");
        assert_eq!(schema.identifier(), "nomad");
        assert_eq!(schema.fields().len(), 1);
    }
}
