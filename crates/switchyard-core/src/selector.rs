//! Primary selection and fallback chain construction.

use crate::cost::compare_by_cost;
use crate::resolver::FilteredCandidate;
use crate::types::{ProviderModel, RoutingStrategy};
use std::cmp::Ordering;

/// Picks the primary candidate among the viable ones.
///
/// * `cheapest`: lowest combined rate, ties by priority.
/// * `quality`: largest context window, ties by priority.
/// * `pinned`: exact match on `pinned`; `None` if it is absent, filtered,
///   or no target was given.
#[must_use]
pub fn select_primary<'a>(
    candidates: &'a [FilteredCandidate],
    strategy: RoutingStrategy,
    pinned: Option<&ProviderModel>,
) -> Option<&'a FilteredCandidate> {
    let mut viable = candidates.iter().filter(|c| c.is_viable());
    match strategy {
        RoutingStrategy::Cheapest => viable.min_by(|a, b| compare_by_cost(a, b)),
        RoutingStrategy::Quality => viable.min_by(|a, b| compare_by_quality(a, b)),
        RoutingStrategy::Pinned => {
            let target = pinned?;
            viable.find(|c| target.matches(&c.provider_id, &c.model_id))
        }
    }
}

/// Larger context window first, then lower priority.
fn compare_by_quality(a: &FilteredCandidate, b: &FilteredCandidate) -> Ordering {
    b.context_window.cmp(&a.context_window).then(a.priority.cmp(&b.priority))
}

/// Orders the remaining viable candidates as fallbacks.
///
/// The primary is never included. Candidates are sorted by priority (stable
/// for equal priorities) and truncated to `max_candidates`.
#[must_use]
pub fn build_fallback_chain(
    candidates: &[FilteredCandidate],
    primary: &ProviderModel,
    max_candidates: usize,
) -> Vec<ProviderModel> {
    let mut rest: Vec<&FilteredCandidate> = candidates
        .iter()
        .filter(|c| c.is_viable() && !primary.matches(&c.provider_id, &c.model_id))
        .collect();
    rest.sort_by_key(|c| c.priority);
    rest.into_iter().take(max_candidates).map(FilteredCandidate::target).collect()
}
