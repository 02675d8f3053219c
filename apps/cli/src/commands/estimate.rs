//! `syd estimate` command implementation.

use crate::catalog_source::CatalogSource;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use switchyard_core::{ActualCost, CostEstimate, ProviderModel, actual_cost, estimate_cost};

/// Arguments for `syd estimate`.
#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Target as provider/model (e.g. openai/gpt-4o)
    pub target: ProviderModel,

    /// Input tokens
    #[arg(long, default_value_t = 1000)]
    pub input: u64,

    /// Output tokens (defaults to half the input)
    #[arg(long)]
    pub output: Option<u64>,

    /// Treat the token counts as actual usage
    #[arg(long, requires = "output")]
    pub actual: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// One printable cost line, from either an estimate or an actual cost.
struct CostLine {
    kind: &'static str,
    input_tokens: u64,
    output_tokens: u64,
    input_cost_usd: f64,
    output_cost_usd: f64,
    total_cost_usd: f64,
}

impl From<&CostEstimate> for CostLine {
    fn from(cost: &CostEstimate) -> Self {
        Self {
            kind: "Estimated",
            input_tokens: cost.input_tokens,
            output_tokens: cost.output_tokens,
            input_cost_usd: cost.input_cost_usd,
            output_cost_usd: cost.output_cost_usd,
            total_cost_usd: cost.total_cost_usd,
        }
    }
}

impl From<&ActualCost> for CostLine {
    fn from(cost: &ActualCost) -> Self {
        Self {
            kind: "Actual",
            input_tokens: cost.input_tokens,
            output_tokens: cost.output_tokens,
            input_cost_usd: cost.input_cost_usd,
            output_cost_usd: cost.output_cost_usd,
            total_cost_usd: cost.total_cost_usd,
        }
    }
}

/// Execute estimate command.
pub fn execute(source: &CatalogSource, args: &EstimateArgs) -> Result<()> {
    let (store, _) = source.load_store()?;
    let entry = store
        .get_model_entry(&args.target.provider_id, &args.target.model_id)
        .with_context(|| format!("Model '{}' is not in the catalog", args.target))?;
    let rates = &entry.cost_rates;

    let (line, json) = match args.output {
        Some(output) if args.actual => {
            let cost = actual_cost(args.input, output, rates, args.target.clone());
            (CostLine::from(&cost), serde_json::to_value(&cost)?)
        }
        output => {
            let cost = estimate_cost(args.input, output, rates, args.target.clone());
            (CostLine::from(&cost), serde_json::to_value(&cost)?)
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{} cost for {}", line.kind.bold(), args.target.to_string().cyan());
    println!("  Input:  {:>10} tokens  ${:.6}", line.input_tokens, line.input_cost_usd);
    println!("  Output: {:>10} tokens  ${:.6}", line.output_tokens, line.output_cost_usd);
    println!("  Total:  {:>17}  {}", "", format!("${:.6}", line.total_cost_usd).green());
    println!("  {}", format!("rates: {} ({})", rates.source, rates.last_updated).dimmed());
    Ok(())
}
