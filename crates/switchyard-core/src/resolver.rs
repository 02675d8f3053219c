//! Alias resolution, candidate expansion and hard-constraint filtering.

use crate::catalog::{CatalogEntry, CatalogSnapshot};
use crate::error::{AliasErrorKind, Result, RoutingError};
use crate::types::{CandidateRef, CostRates, FilterReason, ProviderModel, RequestConstraints};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// A candidate expanded with catalog data for one routing call.
///
/// Records are created per call and dropped with it. Filters mark records
/// instead of removing them, so the final summary can account for every
/// candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCandidate {
    /// Provider identifier.
    pub provider_id: String,
    /// Model identifier.
    pub model_id: String,
    /// Priority from the alias mapping; lower is preferred.
    pub priority: u32,
    /// Context window in tokens (0 when the model was not found).
    pub context_window: u64,
    /// Streaming support.
    pub supports_streaming: bool,
    /// Tool support.
    pub supports_tools: bool,
    /// Pricing.
    pub cost_rates: CostRates,
    /// Serving region, if any.
    pub region: Option<String>,
    /// Whether a filter eliminated this candidate.
    pub filtered: bool,
    /// First reason that eliminated it.
    pub filter_reason: Option<FilterReason>,
}

impl FilteredCandidate {
    /// Expands a candidate reference with its catalog entry.
    #[must_use]
    pub fn from_entry(candidate: &CandidateRef, entry: &CatalogEntry) -> Self {
        Self {
            provider_id: candidate.provider_id.clone(),
            model_id: candidate.model_id.clone(),
            priority: candidate.priority,
            context_window: entry.context_window,
            supports_streaming: entry.supports_streaming,
            supports_tools: entry.supports_tools,
            cost_rates: entry.cost_rates.clone(),
            region: entry.region.clone(),
            filtered: false,
            filter_reason: None,
        }
    }

    /// A record for a candidate whose catalog entry is gone.
    #[must_use]
    pub fn missing(candidate: &CandidateRef) -> Self {
        Self {
            provider_id: candidate.provider_id.clone(),
            model_id: candidate.model_id.clone(),
            priority: candidate.priority,
            context_window: 0,
            supports_streaming: false,
            supports_tools: false,
            cost_rates: CostRates::new(0.0, 0.0, "unknown", NaiveDate::default()),
            region: None,
            filtered: true,
            filter_reason: Some(FilterReason::ModelNotFound),
        }
    }

    /// The `(provider, model)` pair of this candidate.
    #[must_use]
    pub fn target(&self) -> ProviderModel {
        ProviderModel::new(self.provider_id.clone(), self.model_id.clone())
    }

    /// True if no filter has eliminated this candidate.
    #[must_use]
    pub fn is_viable(&self) -> bool {
        !self.filtered
    }

    /// Marks the candidate as filtered.
    ///
    /// Has no effect on an already filtered candidate: the first reason is
    /// kept. Returns whether the mark was applied.
    pub fn mark_filtered(&mut self, reason: FilterReason) -> bool {
        if self.filtered {
            return false;
        }
        self.filtered = true;
        self.filter_reason = Some(reason);
        true
    }
}

/// Number of candidates still viable.
#[must_use]
pub fn viable_count(candidates: &[FilteredCandidate]) -> usize {
    candidates.iter().filter(|c| c.is_viable()).count()
}

/// Counts filter reasons over all candidates.
#[must_use]
pub fn filter_counts(candidates: &[FilteredCandidate]) -> BTreeMap<FilterReason, usize> {
    let mut counts = BTreeMap::new();
    for reason in candidates.iter().filter_map(|c| c.filter_reason) {
        *counts.entry(reason).or_insert(0) += 1;
    }
    counts
}

/// Resolves an alias to its enabled candidates, sorted by priority.
///
/// Candidates whose catalog entry is disabled are dropped here. A candidate
/// whose entry cannot be found at all is kept, so that expansion can report
/// it as `model_not_found`.
///
/// # Errors
/// Returns [`RoutingError::AliasResolution`] for an unknown or disabled
/// alias, or when every candidate points at a disabled model.
pub fn resolve_alias_or_throw(
    snapshot: &CatalogSnapshot,
    alias: &str,
) -> Result<Vec<CandidateRef>> {
    let mapping = snapshot
        .get_alias_mapping(alias)
        .ok_or_else(|| RoutingError::alias(alias, AliasErrorKind::UnknownAlias))?;

    if !mapping.enabled {
        return Err(RoutingError::alias(alias, AliasErrorKind::DisabledAlias));
    }

    let mut candidates: Vec<CandidateRef> = mapping
        .candidates
        .iter()
        .filter(|c| {
            snapshot
                .get_model_entry(&c.provider_id, &c.model_id)
                .is_none_or(|entry| entry.enabled)
        })
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(RoutingError::alias(alias, AliasErrorKind::NoCandidates));
    }

    candidates.sort_by_key(|c| c.priority);
    debug!(alias = %alias, candidates = candidates.len(), "Alias resolved");
    Ok(candidates)
}

/// Candidates of `alias` whose catalog entry exists but is disabled.
///
/// These never reach selection; the orchestrator expands them only so the
/// filter summary can report them as `model_disabled`.
#[must_use]
pub fn disabled_candidates(snapshot: &CatalogSnapshot, alias: &str) -> Vec<CandidateRef> {
    snapshot
        .get_alias_mapping(alias)
        .map(|mapping| {
            mapping
                .candidates
                .iter()
                .filter(|c| {
                    snapshot
                        .get_model_entry(&c.provider_id, &c.model_id)
                        .is_some_and(|entry| !entry.enabled)
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Attaches catalog data to each candidate.
///
/// Candidates that no longer exist in the catalog are returned already
/// filtered with `model_not_found`, and candidates whose entry is disabled
/// with `model_disabled`.
#[must_use]
pub fn expand_candidates(
    snapshot: &CatalogSnapshot,
    refs: &[CandidateRef],
) -> Vec<FilteredCandidate> {
    refs.iter()
        .map(|candidate| {
            let Some(entry) = snapshot.get_model_entry(&candidate.provider_id, &candidate.model_id)
            else {
                return FilteredCandidate::missing(candidate);
            };
            let mut expanded = FilteredCandidate::from_entry(candidate, entry);
            if !entry.enabled {
                expanded.mark_filtered(FilterReason::ModelDisabled);
            }
            expanded
        })
        .collect()
}

/// Hard constraints derived from one request.
#[derive(Debug, Clone, Copy)]
pub struct HardConstraints<'a> {
    /// Candidate must support streaming.
    pub stream_required: bool,
    /// Minimum context window.
    pub context_floor: u64,
    /// Providers allowed; `None` or empty means any.
    pub vendor_allowlist: Option<&'a [String]>,
    /// Regions allowed; `None` or empty means any.
    pub region_allowlist: Option<&'a [String]>,
}

impl<'a> HardConstraints<'a> {
    /// Derives the constraints for a request.
    ///
    /// The context floor is the larger of the estimated input tokens and
    /// the requested context length.
    #[must_use]
    pub fn new(
        stream_required: bool,
        estimated_input_tokens: u64,
        constraints: Option<&'a RequestConstraints>,
    ) -> Self {
        let requested = constraints.and_then(|c| c.max_context_length).unwrap_or(0);
        Self {
            stream_required,
            context_floor: estimated_input_tokens.max(requested),
            vendor_allowlist: constraints.and_then(|c| c.vendor_allowlist.as_deref()),
            region_allowlist: constraints.and_then(|c| c.region_allowlist.as_deref()),
        }
    }

    /// First violated constraint, checked as streaming, context, vendor,
    /// region.
    #[must_use]
    pub fn first_violation(&self, candidate: &FilteredCandidate) -> Option<FilterReason> {
        if self.stream_required && !candidate.supports_streaming {
            return Some(FilterReason::StreamingNotSupported);
        }
        if candidate.context_window < self.context_floor {
            return Some(FilterReason::ContextWindowExceeded);
        }
        if let Some(vendors) = non_empty(self.vendor_allowlist)
            && !vendors.contains(&candidate.provider_id)
        {
            return Some(FilterReason::VendorNotAllowed);
        }
        if let Some(regions) = non_empty(self.region_allowlist) {
            let allowed = candidate.region.as_ref().is_some_and(|r| regions.contains(r));
            if !allowed {
                return Some(FilterReason::RegionNotAllowed);
            }
        }
        None
    }
}

fn non_empty(list: Option<&[String]>) -> Option<&[String]> {
    list.filter(|l| !l.is_empty())
}

/// Applies hard constraints to every viable candidate.
///
/// Already-filtered candidates keep their reason.
#[must_use]
pub fn apply_hard_constraints(
    mut candidates: Vec<FilteredCandidate>,
    constraints: &HardConstraints<'_>,
) -> Vec<FilteredCandidate> {
    for candidate in candidates.iter_mut().filter(|c| c.is_viable()) {
        if let Some(reason) = constraints.first_violation(candidate) {
            candidate.mark_filtered(reason);
        }
    }
    debug!(
        viable = viable_count(&candidates),
        total = candidates.len(),
        context_floor = constraints.context_floor,
        "Hard constraints applied"
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{alias, entry};

    fn snapshot() -> CatalogSnapshot {
        let mut disabled = entry("openai", "gpt-4-0613", 8192, 0.03, 0.06);
        disabled.enabled = false;
        let mut eu = entry("azure", "gpt-4o", 128_000, 0.0025, 0.01);
        eu.region = Some("eu".to_string());
        let mut no_stream = entry("local", "tiny", 4096, 0.0, 0.0);
        no_stream.supports_streaming = false;

        let mut off = alias("off", &[("openai", "gpt-4o", 1)]);
        off.enabled = false;

        CatalogSnapshot::build(
            vec![entry("openai", "gpt-4o", 128_000, 0.0025, 0.01), disabled, eu, no_stream],
            vec![
                alias(
                    "gpt-4",
                    &[("azure", "gpt-4o", 2), ("openai", "gpt-4-0613", 0), ("openai", "gpt-4o", 1)],
                ),
                alias("legacy", &[("openai", "gpt-4-0613", 1)]),
                alias("mixed", &[("local", "tiny", 1), ("azure", "gpt-4o", 2)]),
                off,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_sorts_by_priority_and_drops_disabled() {
        let refs = resolve_alias_or_throw(&snapshot(), "gpt-4").unwrap();
        let targets: Vec<String> = refs.iter().map(|c| c.target().to_string()).collect();
        assert_eq!(targets, vec!["openai/gpt-4o", "azure/gpt-4o"]);
    }

    #[test]
    fn test_resolve_errors() {
        let snap = snapshot();
        let kind = |alias: &str| match resolve_alias_or_throw(&snap, alias) {
            Err(RoutingError::AliasResolution { kind, .. }) => kind,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(kind("nope"), AliasErrorKind::UnknownAlias);
        assert_eq!(kind("off"), AliasErrorKind::DisabledAlias);
        assert_eq!(kind("legacy"), AliasErrorKind::NoCandidates);
    }

    #[test]
    fn test_expand_marks_missing_models() {
        let snap = snapshot();
        let refs = vec![
            CandidateRef::new("openai", "gpt-4o", 1),
            CandidateRef::new("ghost", "m", 2),
        ];
        let expanded = expand_candidates(&snap, &refs);

        assert!(expanded[0].is_viable());
        assert_eq!(expanded[0].context_window, 128_000);
        assert!(!expanded[1].is_viable());
        assert_eq!(expanded[1].filter_reason, Some(FilterReason::ModelNotFound));
    }

    #[test]
    fn test_disabled_candidates_are_expanded_as_filtered() {
        let snap = snapshot();
        let disabled = disabled_candidates(&snap, "gpt-4");
        assert_eq!(disabled, vec![CandidateRef::new("openai", "gpt-4-0613", 0)]);
        assert!(disabled_candidates(&snap, "mixed").is_empty());
        assert!(disabled_candidates(&snap, "nope").is_empty());

        let expanded = expand_candidates(&snap, &disabled);
        assert_eq!(expanded[0].filter_reason, Some(FilterReason::ModelDisabled));
        assert_eq!(expanded[0].context_window, 8192);
    }

    #[test]
    fn test_first_violation_order() {
        let snap = snapshot();
        let refs = resolve_alias_or_throw(&snap, "mixed").unwrap();
        let vendors = vec!["openai".to_string()];
        let request = RequestConstraints {
            vendor_allowlist: Some(vendors),
            ..RequestConstraints::default()
        };
        // local/tiny fails streaming, context and vendor; only streaming is reported.
        let hard = HardConstraints::new(true, 10_000, Some(&request));
        let result = apply_hard_constraints(expand_candidates(&snap, &refs), &hard);

        assert_eq!(result[0].filter_reason, Some(FilterReason::StreamingNotSupported));
        assert_eq!(result[1].filter_reason, Some(FilterReason::VendorNotAllowed));
    }

    #[test]
    fn test_context_reported_before_vendor_and_region() {
        let snap = snapshot();
        let refs = resolve_alias_or_throw(&snap, "mixed").unwrap();
        let request = RequestConstraints {
            vendor_allowlist: Some(vec!["openai".to_string()]),
            region_allowlist: Some(vec!["us".to_string()]),
            ..RequestConstraints::default()
        };
        // local/tiny streams but fails context, vendor and region.
        let hard = HardConstraints::new(false, 10_000, Some(&request));
        let result = apply_hard_constraints(expand_candidates(&snap, &refs), &hard);

        assert_eq!(result[0].filter_reason, Some(FilterReason::ContextWindowExceeded));
        assert_eq!(result[1].filter_reason, Some(FilterReason::VendorNotAllowed));
    }

    #[test]
    fn test_vendor_reported_before_region() {
        let snap = snapshot();
        let refs = resolve_alias_or_throw(&snap, "mixed").unwrap();
        let request = RequestConstraints {
            vendor_allowlist: Some(vec!["openai".to_string()]),
            region_allowlist: Some(vec!["us".to_string()]),
            ..RequestConstraints::default()
        };
        let hard = HardConstraints::new(false, 100, Some(&request));
        let result = apply_hard_constraints(expand_candidates(&snap, &refs), &hard);

        // azure/gpt-4o is in "eu", local/tiny has no region; both fail vendor first.
        assert!(result.iter().all(|c| c.filter_reason == Some(FilterReason::VendorNotAllowed)));
    }

    #[test]
    fn test_context_floor_uses_larger_value() {
        let request = RequestConstraints {
            max_context_length: Some(150_000),
            ..Default::default()
        };
        let hard = HardConstraints::new(false, 1_000, Some(&request));
        assert_eq!(hard.context_floor, 150_000);

        let hard = HardConstraints::new(false, 9_000, None);
        assert_eq!(hard.context_floor, 9_000);
    }

    #[test]
    fn test_region_allowlist_rejects_unknown_region() {
        let snap = snapshot();
        let refs = resolve_alias_or_throw(&snap, "gpt-4").unwrap();
        let request = RequestConstraints {
            region_allowlist: Some(vec!["eu".to_string()]),
            ..Default::default()
        };
        let hard = HardConstraints::new(false, 100, Some(&request));
        let result = apply_hard_constraints(expand_candidates(&snap, &refs), &hard);

        // openai/gpt-4o has no region in this fixture.
        assert_eq!(result[0].filter_reason, Some(FilterReason::RegionNotAllowed));
        assert!(result[1].is_viable());
    }

    #[test]
    fn test_empty_allowlists_do_not_restrict() {
        let snap = snapshot();
        let refs = resolve_alias_or_throw(&snap, "gpt-4").unwrap();
        let request = RequestConstraints {
            vendor_allowlist: Some(vec![]),
            region_allowlist: Some(vec![]),
            ..Default::default()
        };
        let hard = HardConstraints::new(false, 100, Some(&request));
        let result = apply_hard_constraints(expand_candidates(&snap, &refs), &hard);
        assert_eq!(viable_count(&result), 2);
    }

    #[test]
    fn test_mark_filtered_keeps_first_reason() {
        let mut candidate = FilteredCandidate::missing(&CandidateRef::new("a", "b", 1));
        assert!(!candidate.mark_filtered(FilterReason::CostExceeded));
        assert_eq!(candidate.filter_reason, Some(FilterReason::ModelNotFound));
    }

    #[test]
    fn test_filter_counts() {
        let snap = snapshot();
        let refs = vec![CandidateRef::new("ghost", "a", 1), CandidateRef::new("ghost", "b", 2)];
        let counts = filter_counts(&expand_candidates(&snap, &refs));
        assert_eq!(counts.get(&FilterReason::ModelNotFound), Some(&2));
    }
}
