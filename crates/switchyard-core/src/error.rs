//! Error taxonomy for routing decisions.
//!
//! The set of errors is closed: callers branch on the variant (or on
//! [`RoutingError::kind`]) rather than on message text.

use crate::types::FilterReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Why an alias could not be turned into candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasErrorKind {
    /// No mapping exists for the alias.
    UnknownAlias,
    /// The mapping exists but is switched off.
    DisabledAlias,
    /// Every candidate under the alias points at a disabled model.
    NoCandidates,
}

impl AliasErrorKind {
    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownAlias => "unknown_alias",
            Self::DisabledAlias => "disabled_alias",
            Self::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for AliasErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat discriminant of [`RoutingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingErrorKind {
    /// See [`RoutingError::AliasResolution`].
    AliasResolution,
    /// See [`RoutingError::PolicyConstraint`].
    PolicyConstraint,
    /// See [`RoutingError::ConfigValidation`].
    ConfigValidation,
    /// See [`RoutingError::PolicyValidation`].
    PolicyValidation,
}

/// Errors produced by the routing engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// The requested alias could not be resolved.
    #[error("Alias resolution failed for '{alias}': {kind}")]
    AliasResolution {
        /// Alias as requested.
        alias: String,
        /// Which resolution step failed.
        kind: AliasErrorKind,
    },

    /// Constraints and policy eliminated every candidate, or no primary
    /// could be selected from the survivors.
    #[error(
        "No viable candidate for alias '{alias}': {reason} [{}]",
        summarize_filter_counts(.filter_counts)
    )]
    PolicyConstraint {
        /// Alias being routed.
        alias: String,
        /// Human-readable summary of the failure.
        reason: String,
        /// How many candidates were removed for each reason, across all
        /// candidates.
        filter_counts: BTreeMap<FilterReason, usize>,
    },

    /// Catalog or alias configuration is invalid. Fatal at startup.
    #[error(
        "Invalid routing configuration ({} violation(s)): {}",
        .violations.len(),
        .violations.join("; ")
    )]
    ConfigValidation {
        /// Every violation found, not just the first.
        violations: Vec<String>,
    },

    /// A tenant routing policy is invalid.
    #[error("Invalid routing policy for tenant '{tenant_id}': {}", .violations.join("; "))]
    PolicyValidation {
        /// Tenant whose policy was rejected.
        tenant_id: String,
        /// Each violated rule, naming the conflicting fields.
        violations: Vec<String>,
    },
}

impl RoutingError {
    /// Returns the flat kind of this error.
    #[must_use]
    pub fn kind(&self) -> RoutingErrorKind {
        match self {
            Self::AliasResolution { .. } => RoutingErrorKind::AliasResolution,
            Self::PolicyConstraint { .. } => RoutingErrorKind::PolicyConstraint,
            Self::ConfigValidation { .. } => RoutingErrorKind::ConfigValidation,
            Self::PolicyValidation { .. } => RoutingErrorKind::PolicyValidation,
        }
    }

    /// Whether the gateway should surface this as a client (4xx) error.
    ///
    /// Alias and constraint failures are caused by the request; config and
    /// policy validation failures are operator problems.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::AliasResolution { .. } | Self::PolicyConstraint { .. })
    }

    /// Filter-reason counts carried by a constraint error, if any.
    #[must_use]
    pub fn filter_counts(&self) -> Option<&BTreeMap<FilterReason, usize>> {
        match self {
            Self::PolicyConstraint { filter_counts, .. } => Some(filter_counts),
            _ => None,
        }
    }

    pub(crate) fn alias(alias: &str, kind: AliasErrorKind) -> Self {
        Self::AliasResolution {
            alias: alias.to_string(),
            kind,
        }
    }
}

/// Renders counts as `reason=count, reason=count`.
pub fn summarize_filter_counts(counts: &BTreeMap<FilterReason, usize>) -> String {
    if counts.is_empty() {
        return "no candidates filtered".to_string();
    }
    counts
        .iter()
        .map(|(reason, count)| format!("{reason}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
