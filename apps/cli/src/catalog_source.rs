//! Where the CLI gets its routing catalog from.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use switchyard_core::{CatalogStore, FallbackConfig, RoutingConfigFile};
use tracing::info;

/// Catalog selection flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct CatalogSource {
    /// Routing config file (defaults to ./switchyard.toml, then ~/.switchyard/routing.toml)
    #[arg(short, long, global = true, conflicts_with = "builtin")]
    pub config: Option<PathBuf>,

    /// Use the built-in default catalog instead of a config file
    #[arg(long, global = true)]
    pub builtin: bool,
}

impl CatalogSource {
    /// Resolves the config file path, if any.
    pub fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        RoutingConfigFile::discover().context(
            "No routing config found. Pass --config <file>, create ./switchyard.toml, \
             or use --builtin",
        )
    }

    /// Builds a catalog store from the selected source.
    pub fn load_store(&self) -> Result<(CatalogStore, FallbackConfig)> {
        if self.builtin {
            info!("Using built-in routing catalog");
            let store = CatalogStore::with_builtin_defaults()?;
            return Ok((store, FallbackConfig::default()));
        }
        let path = self.config_path()?;
        let config = RoutingConfigFile::load_from_file(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        info!(path = %path.display(), "Using routing config file");
        Ok(config.into_store()?)
    }
}
