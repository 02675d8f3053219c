//! TOML configuration file support for the routing catalog.

use super::{AliasMapping, CatalogEntry, CatalogSnapshot, CatalogStore};
use crate::error::RoutingError;
use crate::types::FallbackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "switchyard.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error (tenant policy documents).
    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but its contents are invalid.
    #[error(transparent)]
    Validation(#[from] RoutingError),
}

/// A complete routing configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfigFile {
    /// Fallback chain settings from the `[routing]` table.
    #[serde(default)]
    pub routing: FallbackConfig,

    /// Catalog entries from `[[models]]`.
    #[serde(default)]
    pub models: Vec<CatalogEntry>,

    /// Alias mappings from `[[aliases]]`.
    #[serde(default)]
    pub aliases: Vec<AliasMapping>,
}

impl RoutingConfigFile {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    /// Returns error if the document cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Runs full catalog validation without building a store.
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] with every violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        CatalogSnapshot::build(self.models.clone(), self.aliases.clone())?;
        Ok(())
    }

    /// Looks for a config file in the usual places.
    ///
    /// Checks `./switchyard.toml`, then `$HOME/.switchyard/routing.toml`.
    /// Returns `None` when neither exists; callers decide whether to fall
    /// back to [`CatalogStore::with_builtin_defaults`].
    #[must_use]
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        let home = std::env::var_os("HOME")?;
        let user = PathBuf::from(home).join(".switchyard").join("routing.toml");
        user.is_file().then_some(user)
    }

    /// Consumes the config and builds a catalog store.
    ///
    /// # Errors
    /// Returns error if validation fails.
    pub fn into_store(self) -> Result<(CatalogStore, FallbackConfig), ConfigError> {
        let store = CatalogStore::new(self.models, self.aliases)?;
        Ok((store, self.routing))
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Reads a raw tenant policy document from a JSON file.
///
/// The result is unvalidated; pass it to
/// [`validate_policy`](crate::policy::validate_policy).
///
/// # Errors
/// Returns error if the file cannot be read or is not valid JSON.
pub fn load_policy_document(path: impl AsRef<Path>) -> Result<serde_json::Value, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}
