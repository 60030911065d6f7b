//! Persistence for committed provider configuration.
//!
//! Committed panels are recorded in a small JSON document keyed by provider
//! identifier. The file lives in the standard configuration directory
//! (`~/.config/cloudpanel/providers.json` on most platforms) unless
//! `CLOUDPANEL_CONFIG_PATH` points elsewhere. Every write goes straight to disk.

use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirs_next::config_dir;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the store location.
pub const CONFIG_PATH_ENV: &str = "CLOUDPANEL_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "providers.json";

/// Error surfaced when reading or writing the store fails.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("configuration store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("configuration store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration committed for one provider type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProviderConfig {
    /// Field values in schema order.
    pub values: IndexMap<String, Value>,
    /// When the panel was submitted.
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StorePayload {
    #[serde(default)]
    providers: IndexMap<String, StoredProviderConfig>,
}

/// Provider configuration store backed by a JSON file.
#[derive(Debug, Default)]
pub struct ProviderConfigStore {
    path: PathBuf,
    payload: RefCell<StorePayload>,
    persist_to_disk: bool,
}

impl ProviderConfigStore {
    /// Opens the store at the default location.
    pub fn load() -> Result<Self, StoreError> {
        Self::at(default_config_path())
    }

    /// Opens the store at an explicit path. A missing file yields an empty store.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let payload = load_payload(&path)?;
        Ok(Self {
            path,
            payload: RefCell::new(payload),
            persist_to_disk: true,
        })
    }

    /// In-memory store used by tests and dry runs.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: RefCell::new(StorePayload::default()),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, identifier: &str) -> Option<StoredProviderConfig> {
        self.payload.borrow().providers.get(identifier).cloned()
    }

    /// Identifiers with stored configuration, in insertion order.
    pub fn identifiers(&self) -> Vec<String> {
        self.payload.borrow().providers.keys().cloned().collect()
    }

    /// Records configuration for a provider, replacing any previous entry.
    ///
    /// The in-memory copy only changes once the file has been written.
    pub fn put(&self, identifier: &str, config: StoredProviderConfig) -> Result<(), StoreError> {
        let mut next = self.payload.borrow().clone();
        next.providers.insert(identifier.to_string(), config);
        if self.persist_to_disk {
            self.save(&next)?;
        }
        *self.payload.borrow_mut() = next;
        debug!(provider = identifier, path = %self.path.display(), "stored provider configuration");
        Ok(())
    }

    /// Removes a provider's configuration and returns it.
    pub fn remove(&self, identifier: &str) -> Result<Option<StoredProviderConfig>, StoreError> {
        let mut next = self.payload.borrow().clone();
        let removed = next.providers.shift_remove(identifier);
        if removed.is_none() {
            return Ok(None);
        }
        if self.persist_to_disk {
            self.save(&next)?;
        }
        *self.payload.borrow_mut() = next;
        Ok(removed)
    }

    fn save(&self, payload: &StorePayload) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Get the default path for the provider configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cloudpanel")
        .join(CONFIG_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<StorePayload, StoreError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse provider configuration file; starting empty"
                );
                Ok(StorePayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(StorePayload::default()),
        Err(error) => Err(StoreError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_config() -> StoredProviderConfig {
        StoredProviderConfig {
            values: IndexMap::from([("name".to_string(), json!("swarm-1")), ("replicas".to_string(), json!(3))]),
            committed_at: Utc::now(),
        }
    }

    #[test]
    fn committed_configuration_survives_reload() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let store = ProviderConfigStore::at(&path).expect("open store");
        let config = sample_config();
        store.put("swarm", config.clone()).expect("write config");

        let reopened = ProviderConfigStore::at(&path).expect("reopen store");
        assert_eq!(reopened.get("swarm"), Some(config));
        assert_eq!(reopened.identifiers(), vec!["swarm".to_string()]);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").expect("write garbage");

        let store = ProviderConfigStore::at(&path).expect("open store");
        assert!(store.identifiers().is_empty());
    }

    #[test]
    fn remove_rewrites_the_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        let store = ProviderConfigStore::at(&path).expect("open store");
        store.put("swarm", sample_config()).expect("write config");

        assert!(store.remove("swarm").expect("remove").is_some());
        assert!(store.remove("swarm").expect("remove again").is_none());
        let reopened = ProviderConfigStore::at(&path).expect("reopen store");
        assert!(reopened.get("swarm").is_none());
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("blocker").join(CONFIG_FILE_NAME);
        let store = ProviderConfigStore::at(&path).expect("open store");
        store.put("kept", sample_config()).expect("write config");

        fs::remove_dir_all(temp_dir.path().join("blocker")).expect("remove parent");
        fs::write(temp_dir.path().join("blocker"), "not a directory").expect("block parent");

        assert!(store.put("swarm", sample_config()).is_err());
        assert!(store.get("swarm").is_none());
        assert!(store.remove("kept").is_err());
        assert!(store.get("kept").is_some());
        assert_eq!(store.identifiers(), vec!["kept".to_string()]);
    }

    #[test]
    fn ephemeral_store_never_touches_disk() {
        let store = ProviderConfigStore::ephemeral();
        store.put("swarm", sample_config()).expect("put");
        assert!(store.get("swarm").is_some());
        assert_eq!(store.path(), Path::new(""));
    }

    #[test]
    fn env_override_controls_default_path() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/tmp/cloudpanel-test/providers.json"), || {
            assert_eq!(default_config_path(), PathBuf::from("/tmp/cloudpanel-test/providers.json"));
        });
        temp_env::with_var(CONFIG_PATH_ENV, Some("   "), || {
            assert!(default_config_path().ends_with(Path::new("cloudpanel").join(CONFIG_FILE_NAME)));
        });
    }
}
