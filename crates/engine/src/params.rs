use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Configuration handed to a controller when it attaches.
///
/// `initialValues` and `readOnly` are interpreted by the controller; every other
/// key is a host-defined option carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelParams {
    /// Values to seed the panel with; they take precedence over field defaults.
    #[serde(default)]
    pub initial_values: Option<IndexMap<String, Value>>,
    /// Panels attached read-only reject edits and submission.
    #[serde(default)]
    pub read_only: bool,
    #[serde(flatten)]
    pub host_options: JsonMap<String, Value>,
}

impl PanelParams {
    pub fn with_initial_values(mut self, values: IndexMap<String, Value>) -> Self {
        self.initial_values = Some(values);
        self
    }

    pub fn with_initial_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial_values.get_or_insert_with(IndexMap::new).insert(name.into(), value.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_camel_case_options_and_keeps_host_extras() {
        let params: PanelParams = serde_json::from_value(json!({
            "initialValues": { "name": "swarm-1" },
            "readOnly": true,
            "profileId": "docker-7"
        }))
        .expect("deserialize params");

        assert!(params.read_only);
        assert_eq!(params.initial_values.as_ref().and_then(|values| values.get("name")), Some(&json!("swarm-1")));
        assert_eq!(params.host_options.get("profileId"), Some(&json!("docker-7")));
        assert!(!params.host_options.contains_key("readOnly"));
    }

    #[test]
    fn defaults_to_editable_without_initial_values() {
        let params: PanelParams = serde_json::from_value(json!({})).expect("deserialize params");
        assert_eq!(params, PanelParams::default());
    }
}
