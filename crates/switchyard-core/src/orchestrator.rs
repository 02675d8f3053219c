//! The routing entry point.

use crate::catalog::CatalogStore;
use crate::cost::{self, ActualCost};
use crate::error::{Result, RoutingError};
use crate::policy::{self, TenantPolicyStore, TenantRoutingPolicy};
use crate::resolver::{self, HardConstraints, viable_count};
use crate::selector;
use crate::snapshot::RoutingPlanSnapshot;
use crate::types::{FallbackConfig, ProviderModel, RoutingInput, RoutingStrategy};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns routing requests into routing plans.
///
/// Holds only a handle to the catalog store; every call works on the
/// snapshot current when it starts and allocates nothing shared, so one
/// orchestrator can serve many threads at once.
#[derive(Debug, Clone)]
pub struct RouteOrchestrator {
    catalog: Arc<CatalogStore>,
}

impl RouteOrchestrator {
    /// Creates an orchestrator over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self { catalog }
    }

    /// The catalog store this orchestrator reads.
    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Produces a routing plan for one request.
    ///
    /// `tenant_policy` is the tenant's own validated policy, or `None` to
    /// route with platform defaults.
    ///
    /// # Errors
    /// * [`RoutingError::AliasResolution`] if the alias is unknown, disabled,
    ///   or has no enabled candidates.
    /// * [`RoutingError::PolicyConstraint`] if filtering leaves nothing
    ///   viable, a pinned target is unavailable, or the request cost cap is
    ///   invalid.
    pub fn route(
        &self,
        input: &RoutingInput,
        tenant_policy: Option<&TenantRoutingPolicy>,
        fallback: &FallbackConfig,
    ) -> Result<RoutingPlanSnapshot> {
        let snapshot = self.catalog.snapshot();
        let alias = input.model_alias.as_str();

        let refs = resolver::resolve_alias_or_throw(&snapshot, alias)?;
        let mut candidates = resolver::expand_candidates(&snapshot, &refs);
        let disabled = resolver::disabled_candidates(&snapshot, alias);
        candidates.extend(resolver::expand_candidates(&snapshot, &disabled));

        let hard = HardConstraints::new(
            input.stream_required,
            input.estimated_input_tokens,
            input.constraints.as_ref(),
        );
        let candidates = resolver::apply_hard_constraints(candidates, &hard);

        let merged = policy::merge_with_platform_defaults(tenant_policy);
        let candidates = policy::apply_tenant_policy(candidates, &merged);

        let candidates = match policy::effective_cost_cap(input, &merged)? {
            Some(cap) => cost::filter_by_cost_cap(
                candidates,
                cap,
                input.estimated_input_tokens,
                input.max_output_tokens,
            ),
            None => candidates,
        };

        let viable = viable_count(&candidates);
        let filter_summary = resolver::filter_counts(&candidates);
        if viable == 0 {
            return Err(RoutingError::PolicyConstraint {
                alias: alias.to_string(),
                reason: format!("all {} candidates were filtered", candidates.len()),
                filter_counts: filter_summary,
            });
        }

        let alias_default = snapshot.get_alias_mapping(alias).and_then(|m| m.default_strategy);
        let resolved = policy::resolve_strategy(input.strategy, tenant_policy, alias_default);
        let pinned = input.pinned_target();
        let strategy = match (resolved, pinned) {
            (RoutingStrategy::Pinned, None) => {
                warn!(alias = %alias, "Pinned strategy without a target, using cheapest");
                RoutingStrategy::Cheapest
            }
            (strategy, _) => strategy,
        };
        debug!(alias = %alias, strategy = %strategy, viable, "Strategy resolved");

        let Some(primary) = selector::select_primary(&candidates, strategy, pinned) else {
            let target = pinned.map_or_else(|| "none".to_string(), ToString::to_string);
            return Err(RoutingError::PolicyConstraint {
                alias: alias.to_string(),
                reason: format!("pinned target '{target}' is not available"),
                filter_counts: filter_summary,
            });
        };

        let primary_target = primary.target();
        let fallbacks =
            selector::build_fallback_chain(&candidates, &primary_target, fallback.max_fallbacks);
        let estimate = cost::estimate_cost(
            input.estimated_input_tokens,
            input.max_output_tokens,
            &primary.cost_rates,
            primary_target.clone(),
        );

        let plan = RoutingPlanSnapshot::new(
            input.tenant_id.clone(),
            alias.to_string(),
            strategy,
            primary_target,
            fallbacks,
            viable,
            estimate,
            filter_summary,
        );

        info!(
            snapshot_id = %plan.snapshot_id(),
            tenant_id = %plan.tenant_id(),
            alias = %alias,
            strategy = %strategy,
            primary = %plan.primary(),
            fallbacks = plan.fallbacks().len(),
            estimated_cost_usd = plan.cost_estimate().total_cost_usd,
            "Routing decision made"
        );

        Ok(plan)
    }

    /// Routes a request using the tenant's policy from `policies`.
    ///
    /// If the policy source fails, the request is routed with platform
    /// defaults and the failure is logged.
    ///
    /// # Errors
    /// Same as [`RouteOrchestrator::route`].
    pub fn route_for_tenant(
        &self,
        input: &RoutingInput,
        policies: &TenantPolicyStore,
        fallback: &FallbackConfig,
    ) -> Result<RoutingPlanSnapshot> {
        let tenant_policy = policies.get(&input.tenant_id).unwrap_or_else(|e| {
            warn!(
                tenant_id = %input.tenant_id,
                error = %e,
                "Policy lookup failed, using platform defaults"
            );
            None
        });
        self.route(input, tenant_policy.as_deref(), fallback)
    }

    /// Actual cost of a finished request on `target`, using current rates.
    ///
    /// Returns `None` if the target is not in the catalog.
    #[must_use]
    pub fn actual_cost_for(
        &self,
        target: &ProviderModel,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Option<ActualCost> {
        let snapshot = self.catalog.snapshot();
        let entry = snapshot.get_model_entry(&target.provider_id, &target.model_id)?;
        Some(cost::actual_cost(input_tokens, output_tokens, &entry.cost_rates, target.clone()))
    }
}
