//! `syd validate` command implementation.

use crate::catalog_source::CatalogSource;
use anyhow::{Result, bail};
use colored::Colorize;
use switchyard_core::{ConfigError, RoutingConfigFile, RoutingError};

/// Execute validate command.
pub fn execute(source: &CatalogSource) -> Result<()> {
    if source.builtin {
        let store = switchyard_core::CatalogStore::with_builtin_defaults()?;
        let snapshot = store.snapshot();
        println!(
            "{} built-in catalog: {} models, {} aliases",
            "✓".green(),
            snapshot.entries().len(),
            snapshot.aliases().len()
        );
        return Ok(());
    }

    let path = source.config_path()?;
    match RoutingConfigFile::load_from_file(&path) {
        Ok(config) => {
            println!(
                "{} {}: {} models, {} aliases, max_fallbacks = {}",
                "✓".green(),
                path.display(),
                config.models.len(),
                config.aliases.len(),
                config.routing.max_fallbacks
            );
            Ok(())
        }
        Err(ConfigError::Validation(RoutingError::ConfigValidation { violations })) => {
            println!("{} {}", "✗".red(), path.display());
            for violation in &violations {
                println!("  {} {}", "-".red(), violation);
            }
            bail!("configuration is invalid ({} violation(s))", violations.len())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to load {}", path.display()))),
    }
}
