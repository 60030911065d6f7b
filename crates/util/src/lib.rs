//! Helpers shared by the CloudPanel engine and CLI.

pub mod config_store;
pub mod path_processing;

pub use config_store::{CONFIG_FILE_NAME, CONFIG_PATH_ENV, ProviderConfigStore, StoreError, StoredProviderConfig, default_config_path};
pub use path_processing::expand_tilde;
