//! Tenant routing policies.
//!
//! A tenant policy narrows the providers a tenant may be routed to, caps the
//! cost of a single request, and can set a default strategy. Policies arrive
//! as raw JSON documents and are validated before use; an invalid policy is
//! rejected and the tenant is routed with platform defaults.

mod store;

pub use store::{InMemoryPolicySource, PolicySource, PolicySourceError, TenantPolicyStore};

use crate::error::{Result, RoutingError};
use crate::resolver::{FilteredCandidate, viable_count};
use crate::types::{FilterReason, RoutingInput, RoutingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Tenant id carried by the platform default policy.
pub const PLATFORM_TENANT_ID: &str = "platform";

/// Per-tenant routing overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantRoutingPolicy {
    /// Owning tenant.
    #[serde(default)]
    pub tenant_id: String,
    /// Providers the tenant may use. `None` or empty allows all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_providers: Option<Vec<String>>,
    /// Providers the tenant must never use. Wins over the allow list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied_providers: Option<Vec<String>>,
    /// Preferred provider. Validated but advisory only: no strategy reads
    /// it when selecting the primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<String>,
    /// Cost cap per request in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_request_usd: Option<f64>,
    /// Tenant default strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<RoutingStrategy>,
}

impl TenantRoutingPolicy {
    /// Creates an empty policy for `tenant_id`.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            allowed_providers: None,
            denied_providers: None,
            preferred_provider: None,
            max_cost_per_request_usd: None,
            default_strategy: None,
        }
    }

    /// The platform default policy.
    #[must_use]
    pub fn platform_defaults() -> Self {
        Self::new(PLATFORM_TENANT_ID).with_default_strategy(RoutingStrategy::PLATFORM_DEFAULT)
    }

    /// Sets the allow list.
    #[must_use]
    pub fn with_allowed_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the deny list.
    #[must_use]
    pub fn with_denied_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the preferred provider.
    #[must_use]
    pub fn with_preferred_provider(mut self, provider: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }

    /// Sets the per-request cost cap.
    #[must_use]
    pub fn with_max_cost_per_request(mut self, usd: f64) -> Self {
        self.max_cost_per_request_usd = Some(usd);
        self
    }

    /// Sets the tenant default strategy.
    #[must_use]
    pub fn with_default_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.default_strategy = Some(strategy);
        self
    }

    /// Checks the policy's cross-field rules and returns every violation.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let allowed = self.allowed_providers.as_deref().unwrap_or_default();
        let denied = self.denied_providers.as_deref().unwrap_or_default();

        for (field, list) in [("allowed_providers", allowed), ("denied_providers", denied)] {
            if list.iter().any(|p| p.trim().is_empty()) {
                violations.push(format!("{field} contains an empty provider id"));
            }
        }

        let overlap: BTreeSet<&str> = allowed
            .iter()
            .filter(|p| denied.contains(p))
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            violations.push(format!(
                "allowed_providers and denied_providers overlap: {}",
                overlap.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }

        if let Some(preferred) = &self.preferred_provider {
            if preferred.trim().is_empty() {
                violations.push("preferred_provider must not be empty".to_string());
            } else if denied.contains(preferred) {
                violations.push(format!(
                    "preferred_provider '{preferred}' is listed in denied_providers"
                ));
            }
        }

        if let Some(cap) = self.max_cost_per_request_usd
            && (!cap.is_finite() || cap < 0.0)
        {
            violations.push(format!("max_cost_per_request_usd must be >= 0.0, got {cap}"));
        }

        violations
    }

    /// Validates this policy.
    ///
    /// # Errors
    /// Returns [`RoutingError::PolicyValidation`] listing every violation.
    pub fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(RoutingError::PolicyValidation {
                tenant_id: self.tenant_id.clone(),
                violations,
            })
        }
    }
}

/// Validates a raw policy document for `tenant_id`.
///
/// A missing `tenant_id` field is filled in; a different one is rejected.
///
/// # Errors
/// Returns [`RoutingError::PolicyValidation`] if the document is malformed
/// or breaks a policy rule.
pub fn validate_policy(raw: &serde_json::Value, tenant_id: &str) -> Result<TenantRoutingPolicy> {
    let invalid = |violations: Vec<String>| RoutingError::PolicyValidation {
        tenant_id: tenant_id.to_string(),
        violations,
    };

    if !raw.is_object() {
        return Err(invalid(vec!["policy must be a JSON object".to_string()]));
    }

    let mut policy: TenantRoutingPolicy =
        serde_json::from_value(raw.clone()).map_err(|e| invalid(vec![e.to_string()]))?;

    let mut violations = Vec::new();
    if policy.tenant_id.is_empty() {
        policy.tenant_id = tenant_id.to_string();
    } else if policy.tenant_id != tenant_id {
        violations.push(format!(
            "tenant_id '{}' does not match requested tenant '{tenant_id}'",
            policy.tenant_id
        ));
    }
    violations.extend(policy.violations());

    if violations.is_empty() { Ok(policy) } else { Err(invalid(violations)) }
}

/// Merges a tenant policy over the platform defaults.
///
/// Tenant fields win field by field. List fields are taken as-is from the
/// tenant; the platform has no lists to union with.
#[must_use]
pub fn merge_with_platform_defaults(policy: Option<&TenantRoutingPolicy>) -> TenantRoutingPolicy {
    let platform = TenantRoutingPolicy::platform_defaults();
    match policy {
        None => platform,
        Some(tenant) => TenantRoutingPolicy {
            tenant_id: tenant.tenant_id.clone(),
            allowed_providers: tenant.allowed_providers.clone().or(platform.allowed_providers),
            denied_providers: tenant.denied_providers.clone().or(platform.denied_providers),
            preferred_provider: tenant.preferred_provider.clone().or(platform.preferred_provider),
            max_cost_per_request_usd: tenant
                .max_cost_per_request_usd
                .or(platform.max_cost_per_request_usd),
            default_strategy: tenant.default_strategy.or(platform.default_strategy),
        },
    }
}

/// Picks the strategy for a request.
///
/// Precedence, highest first: request, tenant default, alias default,
/// platform default. `tenant` must be the tenant's own policy, not the
/// merged one, or the alias default would never be reached.
#[must_use]
pub fn resolve_strategy(
    requested: Option<RoutingStrategy>,
    tenant: Option<&TenantRoutingPolicy>,
    alias_default: Option<RoutingStrategy>,
) -> RoutingStrategy {
    requested
        .or_else(|| tenant.and_then(|p| p.default_strategy))
        .or(alias_default)
        .unwrap_or(RoutingStrategy::PLATFORM_DEFAULT)
}

/// Why a provider is not allowed for the tenant, if it is not.
#[must_use]
pub fn provider_rejection(provider_id: &str, policy: &TenantRoutingPolicy) -> Option<FilterReason> {
    if policy.denied_providers.as_ref().is_some_and(|d| d.iter().any(|p| p == provider_id)) {
        return Some(FilterReason::ProviderDenied);
    }
    match policy.allowed_providers.as_deref() {
        Some(allowed) if !allowed.is_empty() && !allowed.iter().any(|p| p == provider_id) => {
            Some(FilterReason::ProviderNotAllowed)
        }
        _ => None,
    }
}

/// Whether the tenant may be routed to `provider_id`.
#[must_use]
pub fn is_provider_allowed(provider_id: &str, policy: &TenantRoutingPolicy) -> bool {
    provider_rejection(provider_id, policy).is_none()
}

/// Cost cap for a request: the request cap if set, otherwise the tenant cap.
///
/// # Errors
/// Returns [`RoutingError::PolicyConstraint`] if the request cap is negative
/// or not finite. Such a cap would otherwise disable the tenant's ceiling.
pub fn effective_cost_cap(
    input: &RoutingInput,
    policy: &TenantRoutingPolicy,
) -> Result<Option<f64>> {
    match input.constraints.as_ref().and_then(|c| c.max_cost_usd) {
        Some(cap) if !cap.is_finite() || cap < 0.0 => Err(RoutingError::PolicyConstraint {
            alias: input.model_alias.clone(),
            reason: format!("max_cost_usd {cap} must be a finite non-negative amount"),
            filter_counts: BTreeMap::new(),
        }),
        Some(cap) => Ok(Some(cap)),
        None => Ok(policy.max_cost_per_request_usd),
    }
}

/// Marks viable candidates whose provider the tenant may not use.
#[must_use]
pub fn apply_tenant_policy(
    mut candidates: Vec<FilteredCandidate>,
    policy: &TenantRoutingPolicy,
) -> Vec<FilteredCandidate> {
    for candidate in candidates.iter_mut().filter(|c| c.is_viable()) {
        if let Some(reason) = provider_rejection(&candidate.provider_id, policy) {
            candidate.mark_filtered(reason);
        }
    }
    debug!(
        tenant_id = %policy.tenant_id,
        viable = viable_count(&candidates),
        "Tenant policy applied"
    );
    candidates
}
