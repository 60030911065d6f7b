//! Docker Swarm-mode cluster provider.
//!
//! Describes the settings an agent cloud profile needs to start containers on
//! a Swarm manager: where the manager listens, which image to run, how many
//! replicas, and optional registry credentials.

use std::sync::Arc;

use cloudpanel_engine::{HostHandle, OptionsHandle, PanelError, PanelParams, ProviderModule, TabbedPaneHandle, register_panel};
use cloudpanel_types::{FieldSpec, FieldValidator, ProviderSchema, Schema, SchemaError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const SWARM_IDENTIFIER: &str = "swarm";
pub const SWARM_TITLE: &str = "Docker Swarm";
pub const DEFAULT_MANAGER_URI: &str = "unix:///var/run/docker.sock";
pub const API_VERSIONS: [&str; 5] = ["1.24", "1.26", "1.30", "1.35", "1.41"];

const MANAGER_SCHEMES: [&str; 3] = ["tcp", "unix", "npipe"];
const MAX_REPLICAS: f64 = 100.0;

static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*=.*$").expect("label regex should compile"));

/// Builds a fresh Swarm schema.
pub fn swarm_schema() -> Result<ProviderSchema, SchemaError> {
    let fields = vec![
        FieldSpec::string("name")
            .required()
            .with_pattern(r"^[A-Za-z0-9][A-Za-z0-9._-]*$")
            .with_length(None, Some(64))
            .with_description("Cloud profile name shown in the agent pool"),
        FieldSpec::string("manager_uri")
            .with_label("Manager URI")
            .required()
            .with_default(DEFAULT_MANAGER_URI)
            .with_placeholder("tcp://manager.example:2376")
            .with_validator(FieldValidator::new(check_manager_uri)),
        FieldSpec::enumeration("api_version", API_VERSIONS)
            .with_label("API version")
            .with_description("Docker Engine API version; negotiated with the daemon when unset"),
        FieldSpec::boolean("use_tls").with_label("Use TLS").with_default(false),
        FieldSpec::string("image")
            .required()
            .with_pattern(r"^[A-Za-z0-9][A-Za-z0-9._/:@-]*$")
            .with_placeholder("registry.example/agent:latest"),
        FieldSpec::number("replicas")
            .required()
            .with_default(1)
            .with_range(Some(1.0), Some(MAX_REPLICAS))
            .with_validator(FieldValidator::new(check_whole_number)),
        FieldSpec::boolean("pull_on_create")
            .with_default(true)
            .with_description("Pull the image before every container start"),
        FieldSpec::string("registry_user"),
        FieldSpec::string("registry_password").secret(),
        FieldSpec::list("labels")
            .with_description("Container labels, one key=value pair per item")
            .with_validator(FieldValidator::new(check_labels)),
        FieldSpec::string("server_url")
            .with_label("Server URL")
            .with_description("Address agents use to reach the build server")
            .with_validator(FieldValidator::new(check_server_url)),
    ];
    Ok(ProviderSchema::new(SWARM_IDENTIFIER, fields)?.with_title(SWARM_TITLE))
}

/// Registration entry point for the Swarm provider.
///
/// Builds one fresh schema and attaches a controller for it at the given
/// placement. Every controller error propagates unchanged.
pub fn init(host: &HostHandle, options: &OptionsHandle, tabbed_pane: &TabbedPaneHandle, params: PanelParams) -> Result<(), PanelError> {
    let schema: Arc<dyn Schema> = Arc::new(swarm_schema()?);
    debug!(provider = SWARM_IDENTIFIER, pane = %tabbed_pane, "registering swarm panel");
    register_panel(host, options, tabbed_pane, params, schema)
}

/// Provider module wrapping [`init`] for a [`cloudpanel_engine::ProviderRegistry`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SwarmProvider;

impl ProviderModule for SwarmProvider {
    fn identifier(&self) -> &str {
        SWARM_IDENTIFIER
    }

    fn title(&self) -> &str {
        SWARM_TITLE
    }

    fn schema(&self) -> Result<Arc<dyn Schema>, SchemaError> {
        Ok(Arc::new(swarm_schema()?))
    }

    fn init(&self, host: &HostHandle, options: &OptionsHandle, tabbed_pane: &TabbedPaneHandle, params: PanelParams) -> Result<(), PanelError> {
        init(host, options, tabbed_pane, params)
    }
}

fn check_manager_uri(value: &Value) -> Result<(), String> {
    let Some(text) = value.as_str() else {
        return Err("value must be text".to_string());
    };
    let uri = Url::parse(text.trim()).map_err(|error| format!("'{}' is not a valid URI: {}", text, error))?;
    if !MANAGER_SCHEMES.contains(&uri.scheme()) {
        return Err(format!("unsupported scheme '{}' (expected tcp, unix or npipe)", uri.scheme()));
    }
    if uri.scheme() == "tcp" && uri.host_str().is_none_or(str::is_empty) {
        return Err("tcp manager URI must name a host".to_string());
    }
    if uri.scheme() != "tcp" && uri.path().trim_matches('/').is_empty() {
        return Err(format!("{} manager URI must name a socket path", uri.scheme()));
    }
    Ok(())
}

fn check_whole_number(value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(number) if number.fract() == 0.0 => Ok(()),
        _ => Err("value must be a whole number".to_string()),
    }
}

fn check_labels(value: &Value) -> Result<(), String> {
    let Some(items) = value.as_array() else {
        return Err("value must be a list".to_string());
    };
    for item in items {
        match item.as_str() {
            Some(label) if LABEL_REGEX.is_match(label) => {}
            Some(label) => return Err(format!("label '{}' must be written as key=value", label)),
            None => return Err(format!("label {} must be text", item)),
        }
    }
    Ok(())
}

fn check_server_url(value: &Value) -> Result<(), String> {
    let Some(text) = value.as_str() else {
        return Err("value must be text".to_string());
    };
    let url = Url::parse(text.trim()).map_err(|error| format!("'{}' is not a valid URL: {}", text, error))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported URL scheme: {} (expected http/https)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpanel_types::{FieldKind, validate_field_value};
    use serde_json::json;

    fn field(name: &str) -> FieldSpec {
        swarm_schema()
            .expect("swarm schema")
            .field(name)
            .cloned()
            .expect("field present")
    }

    #[test]
    fn schema_declares_fields_in_panel_order() {
        let schema = swarm_schema().expect("swarm schema");
        let names: Vec<&str> = schema.fields().iter().map(|field| field.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "manager_uri",
                "api_version",
                "use_tls",
                "image",
                "replicas",
                "pull_on_create",
                "registry_user",
                "registry_password",
                "labels",
                "server_url",
            ]
        );
        assert_eq!(schema.title(), Some(SWARM_TITLE));
        assert_eq!(field("api_version").kind, FieldKind::Enum);
        assert!(field("registry_password").secret);
    }

    #[test]
    fn manager_uri_accepts_docker_endpoints() {
        let manager = field("manager_uri");
        for uri in ["unix:///var/run/docker.sock", "tcp://10.0.0.5:2376", "npipe:////./pipe/docker_engine"] {
            assert_eq!(validate_field_value(&json!(uri), &manager), Ok(()), "{}", uri);
        }
        assert!(validate_field_value(&json!("http://manager:2375"), &manager).is_err());
        assert!(validate_field_value(&json!("unix://"), &manager).is_err());
        assert!(validate_field_value(&json!("manager:2375"), &manager).is_err());
    }

    #[test]
    fn replicas_must_be_whole_and_bounded() {
        let replicas = field("replicas");
        assert_eq!(validate_field_value(&json!(3), &replicas), Ok(()));
        assert_eq!(validate_field_value(&json!(2.5), &replicas), Err("value must be a whole number".to_string()));
        assert_eq!(validate_field_value(&json!(0), &replicas), Err("value must be at least 1".to_string()));
        assert_eq!(validate_field_value(&json!(101), &replicas), Err("value must be at most 100".to_string()));
    }

    #[test]
    fn labels_are_key_value_pairs() {
        let labels = field("labels");
        assert_eq!(validate_field_value(&json!(["team=ci", "tier="]), &labels), Ok(()));
        assert_eq!(
            validate_field_value(&json!(["team=ci", "broken"]), &labels),
            Err("label 'broken' must be written as key=value".to_string())
        );
    }

    #[test]
    fn image_and_name_follow_their_patterns() {
        assert_eq!(validate_field_value(&json!("registry.example/agent:2024.1"), &field("image")), Ok(()));
        assert!(validate_field_value(&json!("agent latest"), &field("image")).is_err());
        assert!(validate_field_value(&json!("-swarm"), &field("name")).is_err());
        assert!(validate_field_value(&json!("a".repeat(65)), &field("name")).is_err());
    }

    #[test]
    fn server_url_requires_http() {
        let server_url = field("server_url");
        assert_eq!(validate_field_value(&json!("https://ci.example"), &server_url), Ok(()));
        assert_eq!(
            validate_field_value(&json!("ftp://ci.example"), &server_url),
            Err("unsupported URL scheme: ftp (expected http/https)".to_string())
        );
    }
}
