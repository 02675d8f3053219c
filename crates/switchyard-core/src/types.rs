//! Shared types for the routing decision engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A concrete `(provider, model)` pair.
///
/// This is the unit the engine hands to the execution layer: the primary
/// target and every fallback are expressed as `ProviderModel`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderModel {
    /// Provider identifier (e.g. "openai", "anthropic", "ollama").
    pub provider_id: String,
    /// Model identifier within the provider.
    pub model_id: String,
}

impl ProviderModel {
    /// Creates a new provider/model pair.
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }

    /// Returns true if this pair refers to the given provider and model.
    #[must_use]
    pub fn matches(&self, provider_id: &str, model_id: &str) -> bool {
        self.provider_id == provider_id && self.model_id == model_id
    }
}

impl fmt::Display for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}

/// Error returned when a `provider/model` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid model spec '{0}', expected 'provider/model'")]
pub struct ParseProviderModelError(pub String);

impl FromStr for ProviderModel {
    type Err = ParseProviderModelError;

    /// Parses `provider/model`. Only the first `/` separates the two parts,
    /// so model ids may themselves contain slashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
                Ok(Self::new(provider, model))
            }
            _ => Err(ParseProviderModelError(s.to_string())),
        }
    }
}

/// One candidate listed under an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRef {
    /// Provider identifier.
    pub provider_id: String,
    /// Model identifier.
    pub model_id: String,
    /// Lower values are tried first.
    pub priority: u32,
}

impl CandidateRef {
    /// Creates a new candidate reference.
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>, priority: u32) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            priority,
        }
    }

    /// The `(provider, model)` pair this candidate points at.
    #[must_use]
    pub fn target(&self) -> ProviderModel {
        ProviderModel::new(self.provider_id.clone(), self.model_id.clone())
    }
}

/// Per-1k-token pricing for a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// USD per 1,000 input tokens.
    pub input_per_1k_tokens: f64,
    /// USD per 1,000 output tokens.
    pub output_per_1k_tokens: f64,
    /// Where the rates came from (price sheet, contract, ...).
    pub source: String,
    /// Date the rates were last checked.
    pub last_updated: NaiveDate,
}

impl CostRates {
    /// Creates a rate card.
    pub fn new(
        input_per_1k_tokens: f64,
        output_per_1k_tokens: f64,
        source: impl Into<String>,
        last_updated: NaiveDate,
    ) -> Self {
        Self { input_per_1k_tokens, output_per_1k_tokens, source: source.into(), last_updated }
    }

    /// Sum of input and output rate, the ranking key for `cheapest`.
    #[must_use]
    pub fn combined_rate(&self) -> f64 {
        self.input_per_1k_tokens + self.output_per_1k_tokens
    }
}

/// Selection rule used to pick the primary candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    /// Lowest combined input+output rate.
    Cheapest,
    /// Largest context window.
    Quality,
    /// Exact provider/model requested by the caller.
    Pinned,
}

impl RoutingStrategy {
    /// Platform-wide default when nothing else specifies a strategy.
    pub const PLATFORM_DEFAULT: Self = Self::Cheapest;

    /// Strategy name as used in config files and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cheapest => "cheapest",
            Self::Quality => "quality",
            Self::Pinned => "pinned",
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown strategy names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid strategy '{0}'. Valid options: cheapest, quality, pinned")]
pub struct ParseStrategyError(pub String);

impl FromStr for RoutingStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cheapest" => Ok(Self::Cheapest),
            "quality" => Ok(Self::Quality),
            "pinned" => Ok(Self::Pinned),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Why a candidate was eliminated.
///
/// A candidate keeps the first reason it is given; later filters never
/// overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    /// The catalog has no entry for the candidate.
    ModelNotFound,
    /// The catalog entry exists but is disabled.
    ModelDisabled,
    /// Streaming was required and the model cannot stream.
    StreamingNotSupported,
    /// The model's context window is below the request's floor.
    ContextWindowExceeded,
    /// Provider not in the request's vendor allow-list.
    VendorNotAllowed,
    /// Model region not in the request's region allow-list.
    RegionNotAllowed,
    /// Provider is on the tenant's deny list.
    ProviderDenied,
    /// Provider is missing from the tenant's allow list.
    ProviderNotAllowed,
    /// Estimated cost is above the effective cost cap.
    CostExceeded,
}

impl FilterReason {
    /// Stable snake_case name, used in error messages and audit records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModelNotFound => "model_not_found",
            Self::ModelDisabled => "model_disabled",
            Self::StreamingNotSupported => "streaming_not_supported",
            Self::ContextWindowExceeded => "context_window_exceeded",
            Self::VendorNotAllowed => "vendor_not_allowed",
            Self::RegionNotAllowed => "region_not_allowed",
            Self::ProviderDenied => "provider_denied",
            Self::ProviderNotAllowed => "provider_not_allowed",
            Self::CostExceeded => "cost_exceeded",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-request constraints supplied by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConstraints {
    /// Context length the request needs; raises the context floor above
    /// the estimated input tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_length: Option<u64>,
    /// Regions the request may be served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_allowlist: Option<Vec<String>>,
    /// Providers the request may be served by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_allowlist: Option<Vec<String>>,
    /// Per-request cost cap in USD; overrides the tenant cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_usd: Option<f64>,
    /// Exact target for the `pinned` strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_provider: Option<ProviderModel>,
}

/// A routing request as received from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingInput {
    /// Calling tenant.
    pub tenant_id: String,
    /// Caller-facing model alias (e.g. "gpt-4").
    pub model_alias: String,
    /// Whether the caller needs a streamed response.
    #[serde(default)]
    pub stream_required: bool,
    /// Estimated prompt size in tokens.
    pub estimated_input_tokens: u64,
    /// Caller-supplied output cap, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    /// Additional hard constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<RequestConstraints>,
    /// Explicit strategy for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RoutingStrategy>,
}

impl RoutingInput {
    /// Creates a request for `alias` on behalf of `tenant_id`.
    pub fn new(
        tenant_id: impl Into<String>,
        model_alias: impl Into<String>,
        estimated_input_tokens: u64,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            model_alias: model_alias.into(),
            stream_required: false,
            estimated_input_tokens,
            max_output_tokens: None,
            constraints: None,
            strategy: None,
        }
    }

    /// Requires streaming support.
    #[must_use]
    pub fn with_streaming(mut self, required: bool) -> Self {
        self.stream_required = required;
        self
    }

    /// Sets the output token cap.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u64) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Sets an explicit strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Replaces the request constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: RequestConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// The request constraints, or an empty set when none were given.
    #[must_use]
    pub fn constraints_or_default(&self) -> RequestConstraints {
        self.constraints.clone().unwrap_or_default()
    }

    /// The pinned target, if the request carries one.
    #[must_use]
    pub fn pinned_target(&self) -> Option<&ProviderModel> {
        self.constraints.as_ref().and_then(|c| c.pinned_provider.as_ref())
    }
}

/// Shape of the fallback chain produced for each decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Maximum number of fallbacks after the primary.
    #[serde(default = "default_max_fallbacks")]
    pub max_fallbacks: usize,
}

fn default_max_fallbacks() -> usize {
    3
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_fallbacks: default_max_fallbacks(),
        }
    }
}

impl FallbackConfig {
    /// Creates a config allowing at most `max_fallbacks` alternatives.
    #[must_use]
    pub fn new(max_fallbacks: usize) -> Self {
        Self { max_fallbacks }
    }
}
