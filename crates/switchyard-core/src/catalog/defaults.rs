//! Built-in catalog used for development and tests.

use super::{AliasMapping, CatalogEntry};
use crate::types::{CandidateRef, CostRates, RoutingStrategy};
use chrono::NaiveDate;

const PRICING_DATE: (i32, u32, u32) = (2024, 11, 20);

fn pricing_date() -> NaiveDate {
    let (y, m, d) = PRICING_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn model(
    provider_id: &str,
    model_id: &str,
    display_name: &str,
    context_window: u64,
    input: f64,
    output: f64,
    supports_tools: bool,
    region: Option<&str>,
) -> CatalogEntry {
    CatalogEntry {
        provider_id: provider_id.to_string(),
        model_id: model_id.to_string(),
        display_name: display_name.to_string(),
        context_window,
        supports_streaming: true,
        supports_tools,
        cost_rates: CostRates::new(input, output, format!("{provider_id}-pricing"), pricing_date()),
        enabled: true,
        region: region.map(str::to_string),
    }
}

fn alias(
    name: &str,
    candidates: &[(&str, &str)],
    strategy: Option<RoutingStrategy>,
) -> AliasMapping {
    AliasMapping {
        alias: name.to_string(),
        candidates: candidates
            .iter()
            .zip(1..)
            .map(|((provider, model), priority)| CandidateRef::new(*provider, *model, priority))
            .collect(),
        default_strategy: strategy,
        enabled: true,
    }
}

/// Default model catalog.
#[must_use]
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    vec![
        model("openai", "gpt-4o", "GPT-4o", 128_000, 0.0025, 0.01, true, Some("us")),
        model("openai", "gpt-4o-mini", "GPT-4o mini", 128_000, 0.000_15, 0.0006, true, Some("us")),
        model("openai", "gpt-4-turbo", "GPT-4 Turbo", 128_000, 0.01, 0.03, true, Some("us")),
        model("azure", "gpt-4o", "GPT-4o (Azure EU)", 128_000, 0.0025, 0.01, true, Some("eu")),
        model(
            "anthropic",
            "claude-3-5-sonnet",
            "Claude 3.5 Sonnet",
            200_000,
            0.003,
            0.015,
            true,
            Some("us"),
        ),
        model(
            "anthropic",
            "claude-3-haiku",
            "Claude 3 Haiku",
            200_000,
            0.000_25,
            0.001_25,
            true,
            Some("us"),
        ),
        model(
            "anthropic",
            "claude-3-opus",
            "Claude 3 Opus",
            200_000,
            0.015,
            0.075,
            true,
            Some("us"),
        ),
        model("ollama", "llama3.2", "Llama 3.2 (local)", 128_000, 0.0, 0.0, false, Some("local")),
    ]
}

/// Default alias mappings over [`builtin_catalog`].
#[must_use]
pub fn builtin_aliases() -> Vec<AliasMapping> {
    vec![
        alias(
            "gpt-4",
            &[("openai", "gpt-4o"), ("azure", "gpt-4o"), ("openai", "gpt-4-turbo")],
            Some(RoutingStrategy::Cheapest),
        ),
        alias(
            "cheap",
            &[("ollama", "llama3.2"), ("openai", "gpt-4o-mini"), ("anthropic", "claude-3-haiku")],
            Some(RoutingStrategy::Cheapest),
        ),
        alias(
            "best",
            &[
                ("anthropic", "claude-3-5-sonnet"),
                ("openai", "gpt-4o"),
                ("anthropic", "claude-3-opus"),
            ],
            Some(RoutingStrategy::Quality),
        ),
        alias(
            "claude",
            &[("anthropic", "claude-3-5-sonnet"), ("anthropic", "claude-3-haiku")],
            None,
        ),
    ]
}
