//! Routing and cost/policy decision engine for LLM providers.
//!
//! Given a caller-facing model alias, request constraints and an optional
//! tenant policy, the engine picks a primary `(provider, model)` target,
//! orders fallbacks, estimates cost, and returns an immutable
//! [`RoutingPlanSnapshot`] describing the decision.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use switchyard_core::{CatalogStore, FallbackConfig, RouteOrchestrator, RoutingInput};
//!
//! let catalog = Arc::new(CatalogStore::with_builtin_defaults()?);
//! let orchestrator = RouteOrchestrator::new(catalog);
//!
//! let input = RoutingInput::new("tenant-a", "cheap", 1_200);
//! let plan = orchestrator.route(&input, None, &FallbackConfig::default())?;
//! assert_eq!(plan.primary().to_string(), "ollama/llama3.2");
//! # Ok::<(), switchyard_core::RoutingError>(())
//! ```
//!
//! The engine is synchronous and performs no I/O on the routing path. The
//! catalog and the tenant policy cache are the only shared state, both
//! behind reader-writer locks.

pub mod catalog;
pub mod cost;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod resolver;
pub mod selector;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod routing_tests;

pub use catalog::{
    AliasMapping, CatalogEntry, CatalogSnapshot, CatalogStore, ConfigError, RoutingConfigFile,
};
pub use cost::{ActualCost, CostEstimate, actual_cost, estimate_cost};
pub use error::{AliasErrorKind, Result, RoutingError, RoutingErrorKind};
pub use orchestrator::RouteOrchestrator;
pub use policy::{
    InMemoryPolicySource, PolicySource, PolicySourceError, TenantPolicyStore, TenantRoutingPolicy,
    validate_policy,
};
pub use resolver::FilteredCandidate;
pub use snapshot::RoutingPlanSnapshot;
pub use types::{
    CandidateRef, CostRates, FallbackConfig, FilterReason, ProviderModel, RequestConstraints,
    RoutingInput, RoutingStrategy,
};
