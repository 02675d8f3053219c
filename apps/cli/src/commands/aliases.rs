//! `syd aliases` command implementation.

use crate::catalog_source::CatalogSource;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

/// Arguments for `syd aliases`.
#[derive(Args, Debug)]
pub struct AliasesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute aliases command.
pub fn execute(source: &CatalogSource, args: &AliasesArgs) -> Result<()> {
    let (store, _) = source.load_store()?;
    let snapshot = store.snapshot();

    if args.json {
        let aliases: Vec<_> = snapshot.aliases().into_iter().cloned().collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "aliases": aliases }))?);
        return Ok(());
    }

    for mapping in snapshot.aliases() {
        let strategy = mapping.default_strategy.map_or("-", |s| s.as_str());
        let name = if mapping.enabled {
            mapping.alias.bold().cyan()
        } else {
            format!("{} (disabled)", mapping.alias).dimmed()
        };
        println!("{}  strategy: {}", name, strategy);

        let mut candidates: Vec<_> = mapping.candidates.iter().collect();
        candidates.sort_by_key(|c| c.priority);
        for candidate in candidates {
            let target = candidate.target();
            let detail = snapshot
                .get_model_entry(&candidate.provider_id, &candidate.model_id)
                .map(|entry| {
                    let mut detail = format!(
                        "{}k ctx, ${}/${} per 1k",
                        entry.context_window / 1000,
                        entry.cost_rates.input_per_1k_tokens,
                        entry.cost_rates.output_per_1k_tokens
                    );
                    if !entry.enabled {
                        detail.push_str(", disabled");
                    }
                    detail
                })
                .unwrap_or_default();
            println!("  {:>3}  {:<36} {}", candidate.priority, target.to_string(), detail.dimmed());
        }
    }
    Ok(())
}
