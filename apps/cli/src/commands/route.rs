//! `syd route` command implementation.

use crate::catalog_source::CatalogSource;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use switchyard_core::catalog::load_policy_document;
use switchyard_core::{
    FallbackConfig, ProviderModel, RequestConstraints, RouteOrchestrator, RoutingInput,
    RoutingStrategy, validate_policy,
};

/// Arguments for `syd route`.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Model alias to route (e.g. gpt-4)
    pub alias: String,

    /// Tenant making the request
    #[arg(long, default_value = "default")]
    pub tenant: String,

    /// Estimated input tokens
    #[arg(long, default_value_t = 1000)]
    pub tokens: u64,

    /// Output token cap
    #[arg(long)]
    pub max_output: Option<u64>,

    /// Require streaming support
    #[arg(long)]
    pub stream: bool,

    /// Strategy (cheapest, quality, pinned)
    #[arg(long)]
    pub strategy: Option<RoutingStrategy>,

    /// Pinned target as provider/model
    #[arg(long)]
    pub pin: Option<ProviderModel>,

    /// Allowed vendor (repeatable)
    #[arg(long = "vendor")]
    pub vendors: Vec<String>,

    /// Allowed region (repeatable)
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Per-request cost cap in USD
    #[arg(long, value_parser = parse_cost_cap)]
    pub max_cost: Option<f64>,

    /// Required context length
    #[arg(long)]
    pub max_context: Option<u64>,

    /// Tenant policy JSON file
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Override max fallbacks from the config
    #[arg(long)]
    pub max_fallbacks: Option<usize>,
}

fn parse_cost_cap(value: &str) -> std::result::Result<f64, String> {
    let cap: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if cap.is_finite() && cap >= 0.0 {
        Ok(cap)
    } else {
        Err(format!("cost cap must be a finite non-negative amount, got {value}"))
    }
}

impl RouteArgs {
    fn to_input(&self) -> RoutingInput {
        let mut input = RoutingInput::new(self.tenant.clone(), self.alias.clone(), self.tokens)
            .with_streaming(self.stream);
        if let Some(tokens) = self.max_output {
            input = input.with_max_output_tokens(tokens);
        }
        if let Some(strategy) = self.strategy {
            input = input.with_strategy(strategy);
        }

        let constraints = RequestConstraints {
            max_context_length: self.max_context,
            region_allowlist: (!self.regions.is_empty()).then(|| self.regions.clone()),
            vendor_allowlist: (!self.vendors.is_empty()).then(|| self.vendors.clone()),
            max_cost_usd: self.max_cost,
            pinned_provider: self.pin.clone(),
        };
        if constraints != RequestConstraints::default() {
            input = input.with_constraints(constraints);
        }
        input
    }
}

/// Execute route command.
pub fn execute(source: &CatalogSource, args: &RouteArgs) -> Result<()> {
    let (store, config_fallback) = source.load_store()?;
    let fallback = args.max_fallbacks.map_or(config_fallback, FallbackConfig::new);

    let policy = args
        .policy
        .as_ref()
        .map(|path| {
            let raw = load_policy_document(path)
                .with_context(|| format!("Failed to read policy {}", path.display()))?;
            validate_policy(&raw, &args.tenant).map_err(anyhow::Error::from)
        })
        .transpose()?;

    let orchestrator = RouteOrchestrator::new(Arc::new(store));
    let plan = orchestrator.route(&args.to_input(), policy.as_ref(), &fallback)?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
