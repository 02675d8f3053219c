//! Concurrent routing while the catalog is reloaded.

use std::sync::Arc;
use std::thread;
use switchyard_core::catalog::{builtin_aliases, builtin_catalog};
use switchyard_core::{
    CatalogStore, FallbackConfig, InMemoryPolicySource, ProviderModel, RouteOrchestrator,
    RoutingInput, TenantPolicyStore,
};

#[test]
fn test_parallel_routes_see_whole_snapshots() {
    let store = Arc::new(CatalogStore::with_builtin_defaults().unwrap());
    let orchestrator = RouteOrchestrator::new(Arc::clone(&store));

    // Same catalog, but "cheap" loses its free local model.
    let mut aliases = builtin_aliases();
    for alias in &mut aliases {
        if alias.alias == "cheap" {
            alias.candidates.retain(|c| c.provider_id != "ollama");
        }
    }

    let input = RoutingInput::new("tenant-a", "cheap", 1_000);
    let before = ProviderModel::new("ollama", "llama3.2");
    let after = ProviderModel::new("openai", "gpt-4o-mini");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let plan = orchestrator
                        .route(&input, None, &FallbackConfig::default())
                        .unwrap();
                    let primary = plan.primary();
                    assert!(
                        primary == &before || primary == &after,
                        "unexpected primary {primary}"
                    );
                    assert!(!plan.fallbacks().contains(primary));
                }
            });
        }
        scope.spawn(|| {
            for i in 0..20 {
                let next = if i % 2 == 0 { aliases.clone() } else { builtin_aliases() };
                store.reload(builtin_catalog(), next).unwrap();
            }
        });
    });

    assert_eq!(store.snapshot().generation(), 20);
}

#[test]
fn test_policy_store_shared_across_threads() {
    let source = Arc::new(InMemoryPolicySource::new());
    source.insert("acme", serde_json::json!({"allowed_providers": ["openai"]}));
    let policies = TenantPolicyStore::new(source);
    let orchestrator =
        RouteOrchestrator::new(Arc::new(CatalogStore::with_builtin_defaults().unwrap()));

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let input = RoutingInput::new("acme", "best", 500);
                    let plan = orchestrator
                        .route_for_tenant(&input, &policies, &FallbackConfig::default())
                        .unwrap();
                    assert_eq!(plan.primary(), &ProviderModel::new("openai", "gpt-4o"));
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                policies.invalidate("acme");
            }
        });
    });

    assert!(policies.cached_count() <= 1);
}
