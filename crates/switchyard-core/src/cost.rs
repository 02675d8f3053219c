//! Cost estimation and cost-based ranking.
//!
//! All prices are per 1,000 tokens. Estimates run before a request is
//! executed; actual costs run afterwards on the real token counts. Both use
//! the same arithmetic.

use crate::resolver::{FilteredCandidate, viable_count};
use crate::types::{CostRates, FilterReason, ProviderModel};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Pre-inference cost estimate for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Target the estimate applies to.
    pub target: ProviderModel,
    /// Input tokens counted.
    pub input_tokens: u64,
    /// Output tokens assumed.
    pub output_tokens: u64,
    /// Input cost in USD.
    pub input_cost_usd: f64,
    /// Output cost in USD.
    pub output_cost_usd: f64,
    /// Total cost in USD.
    pub total_cost_usd: f64,
}

/// Post-inference cost from real token counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualCost {
    /// Target that served the request.
    pub target: ProviderModel,
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Input cost in USD.
    pub input_cost_usd: f64,
    /// Output cost in USD.
    pub output_cost_usd: f64,
    /// Total cost in USD.
    pub total_cost_usd: f64,
}

/// Output tokens assumed for an estimate.
///
/// Uses the caller's cap when given, otherwise half the input tokens
/// rounded up.
#[must_use]
pub fn estimated_output_tokens(input_tokens: u64, max_output_tokens: Option<u64>) -> u64 {
    max_output_tokens.unwrap_or_else(|| input_tokens.div_ceil(2))
}

#[allow(clippy::cast_precision_loss)]
fn token_cost(tokens: u64, rate_per_1k: f64) -> f64 {
    (tokens as f64 / 1000.0) * rate_per_1k
}

/// Estimates the cost of a request before execution.
///
/// # Arguments
/// * `input_tokens` - Estimated prompt tokens
/// * `max_output_tokens` - Output cap; half the input is assumed when absent
/// * `rates` - Pricing of the target
/// * `target` - Provider/model the estimate is for
#[must_use]
pub fn estimate_cost(
    input_tokens: u64,
    max_output_tokens: Option<u64>,
    rates: &CostRates,
    target: ProviderModel,
) -> CostEstimate {
    let output_tokens = estimated_output_tokens(input_tokens, max_output_tokens);
    let input_cost_usd = token_cost(input_tokens, rates.input_per_1k_tokens);
    let output_cost_usd = token_cost(output_tokens, rates.output_per_1k_tokens);
    CostEstimate {
        target,
        input_tokens,
        output_tokens,
        input_cost_usd,
        output_cost_usd,
        total_cost_usd: input_cost_usd + output_cost_usd,
    }
}

/// Computes the real cost of an executed request.
#[must_use]
pub fn actual_cost(
    input_tokens: u64,
    output_tokens: u64,
    rates: &CostRates,
    target: ProviderModel,
) -> ActualCost {
    let estimate = estimate_cost(input_tokens, Some(output_tokens), rates, target);
    ActualCost {
        target: estimate.target,
        input_tokens,
        output_tokens,
        input_cost_usd: estimate.input_cost_usd,
        output_cost_usd: estimate.output_cost_usd,
        total_cost_usd: estimate.total_cost_usd,
    }
}

/// Orders two candidates by combined rate, then by priority.
#[must_use]
pub fn compare_by_cost(a: &FilteredCandidate, b: &FilteredCandidate) -> Ordering {
    a.cost_rates
        .combined_rate()
        .total_cmp(&b.cost_rates.combined_rate())
        .then(a.priority.cmp(&b.priority))
}

/// Sorts candidates by ascending combined rate.
///
/// The sort is stable and ties are broken by priority, so equal-cost
/// candidates keep their alias ordering.
#[must_use]
pub fn sort_by_cost(mut candidates: Vec<FilteredCandidate>) -> Vec<FilteredCandidate> {
    candidates.sort_by(compare_by_cost);
    candidates
}

/// Marks viable candidates whose estimated cost exceeds `max_cost_usd`.
///
/// Candidates filtered earlier keep their original reason.
#[must_use]
pub fn filter_by_cost_cap(
    mut candidates: Vec<FilteredCandidate>,
    max_cost_usd: f64,
    input_tokens: u64,
    max_output_tokens: Option<u64>,
) -> Vec<FilteredCandidate> {
    for candidate in candidates.iter_mut().filter(|c| c.is_viable()) {
        let estimate = estimate_cost(
            input_tokens,
            max_output_tokens,
            &candidate.cost_rates,
            candidate.target(),
        );
        if estimate.total_cost_usd > max_cost_usd {
            debug!(
                candidate = %estimate.target,
                estimated = estimate.total_cost_usd,
                cap = max_cost_usd,
                "Candidate exceeds cost cap"
            );
            candidate.mark_filtered(FilterReason::CostExceeded);
        }
    }
    debug!(viable = viable_count(&candidates), cap = max_cost_usd, "Cost cap applied");
    candidates
}
