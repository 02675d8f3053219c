//! Model catalog and alias mappings.
//!
//! The catalog is validated once and then read many times. A
//! [`CatalogStore`] holds the current [`CatalogSnapshot`] behind a
//! reader-writer lock; readers clone the `Arc` and never observe a
//! partially loaded catalog, and a reload swaps the whole snapshot.

mod config;
mod defaults;

pub use config::{ConfigError, RoutingConfigFile, load_policy_document};
pub use defaults::{builtin_aliases, builtin_catalog};

use crate::error::{Result, RoutingError};
use crate::types::{CandidateRef, CostRates, ProviderModel, RoutingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Capabilities and pricing of one `(provider, model)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider identifier.
    pub provider_id: String,
    /// Model identifier.
    pub model_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Context window in tokens.
    pub context_window: u64,
    /// Whether the model can stream output.
    #[serde(default)]
    pub supports_streaming: bool,
    /// Whether the model supports tool calls.
    #[serde(default)]
    pub supports_tools: bool,
    /// Pricing.
    pub cost_rates: CostRates,
    /// Disabled entries stay in the catalog but are never routed to.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Serving region, if pinned to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

fn default_true() -> bool {
    true
}

impl CatalogEntry {
    /// The key this entry is stored under.
    #[must_use]
    pub fn key(&self) -> ProviderModel {
        ProviderModel::new(self.provider_id.clone(), self.model_id.clone())
    }
}

/// Maps a caller-facing alias onto an ordered list of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasMapping {
    /// Alias name, unique within the catalog.
    pub alias: String,
    /// Candidates; lower `priority` is tried first.
    pub candidates: Vec<CandidateRef>,
    /// Strategy used when neither the request nor the tenant picks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<RoutingStrategy>,
    /// Disabled aliases fail resolution.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Immutable, validated view of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    generation: u64,
    entries: Vec<CatalogEntry>,
    index: HashMap<ProviderModel, usize>,
    aliases: HashMap<String, AliasMapping>,
}

impl CatalogSnapshot {
    /// Validates the given data and builds a snapshot.
    ///
    /// Every violation is collected before failing, so one bad config
    /// reports all of its problems at once.
    ///
    /// # Errors
    /// Returns [`RoutingError::ConfigValidation`] listing every violation.
    pub fn build(entries: Vec<CatalogEntry>, aliases: Vec<AliasMapping>) -> Result<Self> {
        let mut violations = Vec::new();
        let mut index = HashMap::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            validate_entry(idx, entry, &mut violations);
            if index.insert(entry.key(), idx).is_some() {
                violations.push(format!("duplicate catalog entry '{}'", entry.key()));
            }
        }

        let mut alias_map = HashMap::with_capacity(aliases.len());
        for (idx, mapping) in aliases.into_iter().enumerate() {
            validate_alias(idx, &mapping, &index, &mut violations);
            if mapping.alias.is_empty() {
                continue;
            }
            let name = mapping.alias.clone();
            if alias_map.insert(name.clone(), mapping).is_some() {
                violations.push(format!("duplicate alias '{name}'"));
            }
        }

        if !violations.is_empty() {
            return Err(RoutingError::ConfigValidation { violations });
        }

        Ok(Self {
            generation: 0,
            entries,
            index,
            aliases: alias_map,
        })
    }

    /// Monotonic counter bumped on every store reload.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All catalog entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Looks up a single entry.
    #[must_use]
    pub fn get_model_entry(&self, provider_id: &str, model_id: &str) -> Option<&CatalogEntry> {
        self.index
            .get(&ProviderModel::new(provider_id, model_id))
            .and_then(|&idx| self.entries.get(idx))
    }

    /// Looks up an alias mapping.
    #[must_use]
    pub fn get_alias_mapping(&self, alias: &str) -> Option<&AliasMapping> {
        self.aliases.get(alias)
    }

    /// All alias mappings, sorted by alias name.
    #[must_use]
    pub fn aliases(&self) -> Vec<&AliasMapping> {
        let mut aliases: Vec<_> = self.aliases.values().collect();
        aliases.sort_by(|a, b| a.alias.cmp(&b.alias));
        aliases
    }
}

fn validate_entry(idx: usize, entry: &CatalogEntry, violations: &mut Vec<String>) {
    let label = if entry.provider_id.is_empty() || entry.model_id.is_empty() {
        format!("models[{idx}]")
    } else {
        format!("models[{idx}] '{}'", entry.key())
    };

    if entry.provider_id.trim().is_empty() {
        violations.push(format!("{label}: provider_id must not be empty"));
    }
    if entry.model_id.trim().is_empty() {
        violations.push(format!("{label}: model_id must not be empty"));
    }
    if entry.display_name.trim().is_empty() {
        violations.push(format!("{label}: display_name must not be empty"));
    }
    if entry.context_window == 0 {
        violations.push(format!("{label}: context_window must be positive"));
    }

    let rates = &entry.cost_rates;
    for (field, value) in [
        ("input_per_1k_tokens", rates.input_per_1k_tokens),
        ("output_per_1k_tokens", rates.output_per_1k_tokens),
    ] {
        if !value.is_finite() || value < 0.0 {
            violations.push(format!("{label}: cost_rates.{field} must be >= 0.0, got {value}"));
        }
    }
    if rates.source.trim().is_empty() {
        violations.push(format!("{label}: cost_rates.source must not be empty"));
    }
    if entry.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
        violations.push(format!("{label}: region must not be blank when set"));
    }
}

fn validate_alias(
    idx: usize,
    mapping: &AliasMapping,
    index: &HashMap<ProviderModel, usize>,
    violations: &mut Vec<String>,
) {
    if mapping.alias.trim().is_empty() {
        violations.push(format!("aliases[{idx}]: alias must not be empty"));
        return;
    }
    let alias = &mapping.alias;

    if mapping.candidates.is_empty() {
        violations.push(format!("alias '{alias}': must list at least one candidate"));
    }

    let mut seen = HashSet::new();
    for candidate in &mapping.candidates {
        let target = candidate.target();
        if !index.contains_key(&target) {
            violations.push(format!(
                "alias '{alias}': candidate '{target}' does not exist in the catalog"
            ));
        }
        if !seen.insert(target.clone()) {
            violations.push(format!("alias '{alias}': candidate '{target}' is listed twice"));
        }
    }
}

/// Shared holder of the current catalog snapshot.
///
/// Cheap to share behind an `Arc`; `route()` calls only take the read lock
/// long enough to clone the snapshot pointer.
#[derive(Debug)]
pub struct CatalogStore {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    /// Validates the catalog and aliases and creates a store.
    ///
    /// # Errors
    /// Returns [`RoutingError::ConfigValidation`] if anything is invalid;
    /// nothing is partially loaded.
    pub fn new(entries: Vec<CatalogEntry>, aliases: Vec<AliasMapping>) -> Result<Self> {
        let snapshot = CatalogSnapshot::build(entries, aliases)?;
        info!(
            models = snapshot.entries.len(),
            aliases = snapshot.aliases.len(),
            "Routing catalog initialized"
        );
        Ok(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Creates a store from the built-in default catalog.
    ///
    /// Meant for development and tests; deployments should load their own
    /// catalog with [`CatalogStore::new`] or [`RoutingConfigFile`].
    ///
    /// # Errors
    /// Returns an error only if the built-in data fails validation.
    pub fn with_builtin_defaults() -> Result<Self> {
        Self::new(builtin_catalog(), builtin_aliases())
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Validates new data and atomically replaces the current snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    ///
    /// # Errors
    /// Returns [`RoutingError::ConfigValidation`] if the new data is invalid.
    pub fn reload(&self, entries: Vec<CatalogEntry>, aliases: Vec<AliasMapping>) -> Result<()> {
        let mut next = CatalogSnapshot::build(entries, aliases)?;
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        next.generation = guard.generation + 1;
        info!(
            generation = next.generation,
            models = next.entries.len(),
            aliases = next.aliases.len(),
            "Routing catalog reloaded"
        );
        *guard = Arc::new(next);
        Ok(())
    }

    /// All catalog entries of the current snapshot.
    #[must_use]
    pub fn get_model_catalog(&self) -> Vec<CatalogEntry> {
        self.snapshot().entries().to_vec()
    }

    /// Looks up one entry in the current snapshot.
    #[must_use]
    pub fn get_model_entry(&self, provider_id: &str, model_id: &str) -> Option<CatalogEntry> {
        self.snapshot().get_model_entry(provider_id, model_id).cloned()
    }

    /// Looks up one alias in the current snapshot.
    #[must_use]
    pub fn get_alias_mapping(&self, alias: &str) -> Option<AliasMapping> {
        self.snapshot().get_alias_mapping(alias).cloned()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn entry(
        provider: &str,
        model: &str,
        window: u64,
        input: f64,
        output: f64,
    ) -> CatalogEntry {
        CatalogEntry {
            provider_id: provider.to_string(),
            model_id: model.to_string(),
            display_name: format!("{provider} {model}"),
            context_window: window,
            supports_streaming: true,
            supports_tools: true,
            cost_rates: CostRates::new(
                input,
                output,
                "test",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ),
            enabled: true,
            region: None,
        }
    }

    pub(crate) fn alias(name: &str, candidates: &[(&str, &str, u32)]) -> AliasMapping {
        AliasMapping {
            alias: name.to_string(),
            candidates: candidates
                .iter()
                .map(|(p, m, prio)| CandidateRef::new(*p, *m, *prio))
                .collect(),
            default_strategy: None,
            enabled: true,
        }
    }

    #[test]
    fn test_build_valid_catalog() {
        let snapshot = CatalogSnapshot::build(
            vec![entry("openai", "gpt-4o", 128_000, 0.0025, 0.01)],
            vec![alias("gpt-4", &[("openai", "gpt-4o", 1)])],
        )
        .unwrap();

        assert_eq!(snapshot.entries().len(), 1);
        assert!(snapshot.get_model_entry("openai", "gpt-4o").is_some());
        assert!(snapshot.get_model_entry("openai", "gpt-3").is_none());
        assert_eq!(snapshot.get_alias_mapping("gpt-4").unwrap().candidates.len(), 1);
        assert_eq!(snapshot.generation(), 0);
    }

    #[test]
    fn test_build_collects_every_violation() {
        let mut bad = entry("openai", "gpt-4o", 0, -1.0, 0.01);
        bad.display_name = String::new();

        let result = CatalogSnapshot::build(
            vec![bad, entry("openai", "gpt-4o", 1000, 0.0, 0.0)],
            vec![
                alias("gpt-4", &[("openai", "missing", 1)]),
                alias("empty", &[]),
            ],
        );

        let Err(RoutingError::ConfigValidation { violations }) = result else {
            panic!("expected ConfigValidation error");
        };
        let joined = violations.join("\n");
        assert!(joined.contains("context_window must be positive"));
        assert!(joined.contains("display_name must not be empty"));
        assert!(joined.contains("input_per_1k_tokens must be >= 0.0"));
        assert!(joined.contains("duplicate catalog entry 'openai/gpt-4o'"));
        assert!(joined.contains("candidate 'openai/missing' does not exist"));
        assert!(joined.contains("alias 'empty': must list at least one candidate"));
        assert_eq!(violations.len(), 6);
    }

    #[test]
    fn test_duplicate_alias_and_candidate() {
        let result = CatalogSnapshot::build(
            vec![entry("openai", "gpt-4o", 1000, 0.0, 0.0)],
            vec![
                alias("a", &[("openai", "gpt-4o", 1), ("openai", "gpt-4o", 2)]),
                alias("a", &[("openai", "gpt-4o", 1)]),
            ],
        );
        let Err(RoutingError::ConfigValidation { violations }) = result else {
            panic!("expected ConfigValidation error");
        };
        assert!(violations.iter().any(|v| v.contains("listed twice")));
        assert!(violations.iter().any(|v| v.contains("duplicate alias 'a'")));
    }

    #[test]
    fn test_disabled_entries_are_valid_references() {
        let mut disabled = entry("openai", "gpt-4-0613", 8192, 0.03, 0.06);
        disabled.enabled = false;
        let result = CatalogSnapshot::build(
            vec![disabled],
            vec![alias("legacy", &[("openai", "gpt-4-0613", 1)])],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_reload_swaps_snapshot_atomically() {
        let store = CatalogStore::new(
            vec![entry("openai", "gpt-4o", 128_000, 0.0025, 0.01)],
            vec![alias("gpt-4", &[("openai", "gpt-4o", 1)])],
        )
        .unwrap();

        let before = store.snapshot();
        store
            .reload(
                vec![entry("anthropic", "claude-3-5-sonnet", 200_000, 0.003, 0.015)],
                vec![alias("best", &[("anthropic", "claude-3-5-sonnet", 1)])],
            )
            .unwrap();
        let after = store.snapshot();

        // Readers holding the old snapshot keep a consistent view.
        assert!(before.get_alias_mapping("gpt-4").is_some());
        assert!(after.get_alias_mapping("gpt-4").is_none());
        assert!(after.get_alias_mapping("best").is_some());
        assert_eq!(after.generation(), before.generation() + 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let store = CatalogStore::new(
            vec![entry("openai", "gpt-4o", 128_000, 0.0025, 0.01)],
            vec![alias("gpt-4", &[("openai", "gpt-4o", 1)])],
        )
        .unwrap();

        let result = store.reload(vec![], vec![alias("gpt-4", &[("openai", "gpt-4o", 1)])]);
        assert!(result.is_err());
        assert!(store.get_alias_mapping("gpt-4").is_some());
        assert_eq!(store.snapshot().generation(), 0);
    }

    #[test]
    fn test_builtin_defaults_are_valid() {
        let store = CatalogStore::with_builtin_defaults().unwrap();
        assert!(store.get_alias_mapping("cheap").is_some());
        assert!(store.get_alias_mapping("best").is_some());
        assert!(store.get_alias_mapping("gpt-4").is_some());
        assert!(!store.get_model_catalog().is_empty());
    }
}
