use std::{fs, path::Path, sync::Arc};

use cloudpanel_types::{ProviderSchema, Schema, SchemaError};

use super::ProviderModule;

/// Provider module whose schema comes from data rather than code.
///
/// Every `schema()` call hands out a clone, so panels never share an instance.
#[derive(Debug, Clone)]
pub struct DeclaredProvider {
    schema: ProviderSchema,
}

impl DeclaredProvider {
    pub fn new(schema: ProviderSchema) -> Result<Self, SchemaError> {
        schema.check_invariants()?;
        Ok(Self { schema })
    }

    /// Loads a YAML or JSON schema document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| SchemaError::Parse(format!("{}: {}", path.display(), error)))?;
        Ok(Self {
            schema: ProviderSchema::from_yaml_str(&text)?,
        })
    }
}

impl ProviderModule for DeclaredProvider {
    fn identifier(&self) -> &str {
        &self.schema.identifier
    }

    fn title(&self) -> &str {
        self.schema.title.as_deref().unwrap_or(&self.schema.identifier)
    }

    fn schema(&self) -> Result<Arc<dyn Schema>, SchemaError> {
        Ok(Arc::new(self.schema.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpanel_types::FieldSpec;

    #[test]
    fn title_falls_back_to_identifier() {
        let schema = ProviderSchema::new("nomad", vec![FieldSpec::string("address")]).expect("valid schema");
        let provider = DeclaredProvider::new(schema.clone()).expect("provider");
        assert_eq!(provider.title(), "nomad");

        let titled = DeclaredProvider::new(schema.with_title("Nomad cluster")).expect("provider");
        assert_eq!(titled.title(), "Nomad cluster");
    }

    #[test]
    fn each_schema_call_is_a_fresh_instance() {
        let schema = ProviderSchema::new("nomad", vec![FieldSpec::string("address")]).expect("valid schema");
        let provider = DeclaredProvider::new(schema).expect("provider");
        let first = provider.schema().expect("schema");
        let second = provider.schema().expect("schema");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.identifier(), second.identifier());
    }

    #[test]
    fn loads_schema_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("nomad.yaml");
        fs::write(&path, "identifier: nomad\nfields:\n  - name: address\n    required: true\n").expect("write schema");

        let provider = DeclaredProvider::from_file(&path).expect("load provider");
        assert_eq!(provider.identifier(), "nomad");
        assert!(matches!(
            DeclaredProvider::from_file(temp_dir.path().join("missing.yaml")),
            Err(SchemaError::Parse(_))
        ));
    }
}
