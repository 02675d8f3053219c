//! The immutable record of one routing decision.

use crate::cost::CostEstimate;
use crate::types::{FilterReason, ProviderModel, RoutingStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Output of a routing call.
///
/// Fields are private; a snapshot is never modified after it is built.
/// It serializes as JSON for the audit collaborator and can be read back
/// for replay checks with [`RoutingPlanSnapshot::same_decision`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPlanSnapshot {
    snapshot_id: Uuid,
    tenant_id: String,
    resolved_alias: String,
    strategy: RoutingStrategy,
    primary: ProviderModel,
    fallbacks: Vec<ProviderModel>,
    candidate_count: usize,
    cost_estimate: CostEstimate,
    #[serde(default)]
    filter_summary: BTreeMap<FilterReason, usize>,
    timestamp: DateTime<Utc>,
}

impl RoutingPlanSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tenant_id: String,
        resolved_alias: String,
        strategy: RoutingStrategy,
        primary: ProviderModel,
        fallbacks: Vec<ProviderModel>,
        candidate_count: usize,
        cost_estimate: CostEstimate,
        filter_summary: BTreeMap<FilterReason, usize>,
    ) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            tenant_id,
            resolved_alias,
            strategy,
            primary,
            fallbacks,
            candidate_count,
            cost_estimate,
            filter_summary,
            timestamp: Utc::now(),
        }
    }

    /// Unique id of this decision.
    #[must_use]
    pub fn snapshot_id(&self) -> Uuid {
        self.snapshot_id
    }

    /// Tenant the decision was made for.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Alias that was resolved.
    #[must_use]
    pub fn resolved_alias(&self) -> &str {
        &self.resolved_alias
    }

    /// Strategy actually used.
    #[must_use]
    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// Selected target.
    #[must_use]
    pub fn primary(&self) -> &ProviderModel {
        &self.primary
    }

    /// Ordered alternatives; never contains the primary.
    #[must_use]
    pub fn fallbacks(&self) -> &[ProviderModel] {
        &self.fallbacks
    }

    /// Number of viable candidates after all filters.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// Estimated cost on the primary.
    #[must_use]
    pub fn cost_estimate(&self) -> &CostEstimate {
        &self.cost_estimate
    }

    /// Why candidates were filtered, counted over all of them.
    #[must_use]
    pub fn filter_summary(&self) -> &BTreeMap<FilterReason, usize> {
        &self.filter_summary
    }

    /// When the decision was made.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Compares two snapshots ignoring `snapshot_id` and `timestamp`.
    #[must_use]
    pub fn same_decision(&self, other: &Self) -> bool {
        self.tenant_id == other.tenant_id
            && self.resolved_alias == other.resolved_alias
            && self.strategy == other.strategy
            && self.primary == other.primary
            && self.fallbacks == other.fallbacks
            && self.candidate_count == other.candidate_count
            && self.cost_estimate == other.cost_estimate
            && self.filter_summary == other.filter_summary
    }
}
