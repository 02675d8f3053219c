//! End-to-end routing scenarios against the built-in catalog.

use std::sync::Arc;
use switchyard_core::{
    AliasErrorKind, CatalogStore, FallbackConfig, FilterReason, ProviderModel, RequestConstraints,
    RouteOrchestrator, RoutingError, RoutingInput, RoutingPlanSnapshot, RoutingStrategy,
    TenantRoutingPolicy,
};

fn orchestrator() -> RouteOrchestrator {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    RouteOrchestrator::new(Arc::new(CatalogStore::with_builtin_defaults().unwrap()))
}

fn route(
    input: &RoutingInput,
    policy: Option<&TenantRoutingPolicy>,
) -> switchyard_core::Result<RoutingPlanSnapshot> {
    orchestrator().route(input, policy, &FallbackConfig::default())
}

#[test]
fn test_cheap_alias_selects_free_local_model() {
    let input =
        RoutingInput::new("tenant-a", "cheap", 2_000).with_strategy(RoutingStrategy::Cheapest);
    let plan = route(&input, None).unwrap();

    assert_eq!(plan.primary(), &ProviderModel::new("ollama", "llama3.2"));
    assert_eq!(plan.cost_estimate().total_cost_usd, 0.0);
    assert_eq!(
        plan.fallbacks(),
        &[
            ProviderModel::new("openai", "gpt-4o-mini"),
            ProviderModel::new("anthropic", "claude-3-haiku"),
        ]
    );
}

#[test]
fn test_best_alias_prefers_larger_context_window() {
    let plan = route(&RoutingInput::new("tenant-a", "best", 2_000), None).unwrap();

    assert_eq!(plan.strategy(), RoutingStrategy::Quality);
    assert_eq!(plan.primary().provider_id, "anthropic");
    assert_eq!(plan.primary(), &ProviderModel::new("anthropic", "claude-3-5-sonnet"));
}

#[test]
fn test_tenant_allow_list_restricts_best_to_openai() {
    let policy = TenantRoutingPolicy::new("tenant-a").with_allowed_providers(["openai"]);
    let plan = route(&RoutingInput::new("tenant-a", "best", 2_000), Some(&policy)).unwrap();

    assert_eq!(plan.primary(), &ProviderModel::new("openai", "gpt-4o"));
    assert!(plan.fallbacks().is_empty());
    assert_eq!(plan.candidate_count(), 1);
    assert_eq!(plan.filter_summary().get(&FilterReason::ProviderNotAllowed), Some(&2));
}

#[test]
fn test_unknown_vendor_reports_every_candidate() {
    let input = RoutingInput::new("tenant-a", "gpt-4", 500).with_constraints(RequestConstraints {
        vendor_allowlist: Some(vec!["nonexistent".to_string()]),
        ..Default::default()
    });
    let err = route(&input, None).unwrap_err();

    let RoutingError::PolicyConstraint { filter_counts, .. } = &err else {
        panic!("expected PolicyConstraint, got {err:?}");
    };
    assert_eq!(filter_counts.get(&FilterReason::VendorNotAllowed), Some(&3));
    assert_eq!(filter_counts.len(), 1);
    assert!(err.to_string().contains("vendor_not_allowed=3"));
    assert!(err.is_client_error());
}

#[test]
fn test_unknown_alias() {
    let err = route(&RoutingInput::new("tenant-a", "gpt-7", 10), None).unwrap_err();
    assert_eq!(
        err,
        RoutingError::AliasResolution {
            alias: "gpt-7".to_string(),
            kind: AliasErrorKind::UnknownAlias
        }
    );
}

#[test]
fn test_strategy_precedence_end_to_end() {
    let tenant =
        TenantRoutingPolicy::new("tenant-a").with_default_strategy(RoutingStrategy::Quality);
    let base = RoutingInput::new("tenant-a", "gpt-4", 1_000);

    // Request strategy wins over tenant and alias.
    let explicit = base.clone().with_strategy(RoutingStrategy::Cheapest);
    assert_eq!(route(&explicit, Some(&tenant)).unwrap().strategy(), RoutingStrategy::Cheapest);

    // Tenant default beats the alias default (cheapest for gpt-4).
    assert_eq!(route(&base, Some(&tenant)).unwrap().strategy(), RoutingStrategy::Quality);

    // Alias default applies when the tenant sets none.
    let best = RoutingInput::new("tenant-a", "best", 1_000);
    let silent = TenantRoutingPolicy::new("tenant-a");
    assert_eq!(route(&best, Some(&silent)).unwrap().strategy(), RoutingStrategy::Quality);

    // Platform default when the alias has none either.
    let claude = RoutingInput::new("tenant-a", "claude", 1_000);
    assert_eq!(route(&claude, None).unwrap().strategy(), RoutingStrategy::Cheapest);
}

#[test]
fn test_region_and_pinned_constraints() {
    let eu_only =
        RoutingInput::new("tenant-a", "gpt-4", 1_000).with_constraints(RequestConstraints {
            region_allowlist: Some(vec!["eu".to_string()]),
            ..Default::default()
        });
    let plan = route(&eu_only, None).unwrap();
    assert_eq!(plan.primary(), &ProviderModel::new("azure", "gpt-4o"));
    assert_eq!(plan.filter_summary().get(&FilterReason::RegionNotAllowed), Some(&2));

    let pinned = RoutingInput::new("tenant-a", "gpt-4", 1_000)
        .with_strategy(RoutingStrategy::Pinned)
        .with_constraints(RequestConstraints {
            pinned_provider: Some(ProviderModel::new("openai", "gpt-4-turbo")),
            ..Default::default()
        });
    let plan = route(&pinned, None).unwrap();
    assert_eq!(plan.strategy(), RoutingStrategy::Pinned);
    assert_eq!(plan.primary(), &ProviderModel::new("openai", "gpt-4-turbo"));
    assert_eq!(
        plan.fallbacks(),
        &[ProviderModel::new("openai", "gpt-4o"), ProviderModel::new("azure", "gpt-4o")]
    );
}

#[test]
fn test_context_floor_eliminates_small_windows() {
    // 150k tokens only fit the 200k Anthropic models.
    let plan = route(&RoutingInput::new("tenant-a", "best", 150_000), None).unwrap();
    assert_eq!(plan.candidate_count(), 2);
    assert_eq!(plan.filter_summary().get(&FilterReason::ContextWindowExceeded), Some(&1));
    assert!(!plan.fallbacks().contains(&ProviderModel::new("openai", "gpt-4o")));
}

#[test]
fn test_request_cost_cap_overrides_tenant_cap() {
    // 10k in + 5k out: gpt-4o = 0.075, gpt-4-turbo = 0.25.
    let tenant = TenantRoutingPolicy::new("tenant-a").with_max_cost_per_request(0.01);
    let input = RoutingInput::new("tenant-a", "gpt-4", 10_000).with_constraints(RequestConstraints {
        max_cost_usd: Some(0.1),
        ..Default::default()
    });
    let plan = route(&input, Some(&tenant)).unwrap();
    assert_eq!(plan.candidate_count(), 2);
    assert_eq!(plan.filter_summary().get(&FilterReason::CostExceeded), Some(&1));

    let tenant_only = RoutingInput::new("tenant-a", "gpt-4", 10_000);
    let err = route(&tenant_only, Some(&tenant)).unwrap_err();
    assert_eq!(err.filter_counts().and_then(|c| c.get(&FilterReason::CostExceeded)), Some(&3));
}

#[test]
fn test_fallback_config_limits_chain() {
    let input = RoutingInput::new("tenant-a", "gpt-4", 1_000);
    let plan = orchestrator().route(&input, None, &FallbackConfig::new(1)).unwrap();
    assert_eq!(plan.fallbacks().len(), 1);
    assert_eq!(plan.candidate_count(), 3);
}
