//! Lazily populated cache of validated tenant policies.

use super::{TenantRoutingPolicy, validate_policy};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure reported by a [`PolicySource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Policy source failed for tenant '{tenant_id}': {message}")]
pub struct PolicySourceError {
    /// Tenant being loaded.
    pub tenant_id: String,
    /// What went wrong.
    pub message: String,
}

impl PolicySourceError {
    /// Creates a new source error.
    pub fn new(tenant_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            message: message.into(),
        }
    }
}

/// Where raw tenant policy documents come from.
///
/// Implementations must be cheap to call concurrently; the store calls
/// `load` at most once per tenant until the entry is invalidated, but
/// several threads may miss the cache at the same time.
pub trait PolicySource: Send + Sync {
    /// Fetches the raw policy for `tenant_id`, or `None` if there is none.
    fn load(&self, tenant_id: &str) -> std::result::Result<Option<Value>, PolicySourceError>;
}

/// A [`PolicySource`] backed by an in-memory map.
#[derive(Debug, Default)]
pub struct InMemoryPolicySource {
    documents: RwLock<HashMap<String, Value>>,
}

impl InMemoryPolicySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces the raw document for a tenant.
    pub fn insert(&self, tenant_id: impl Into<String>, document: Value) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tenant_id.into(), document);
    }

    /// Removes a tenant's document.
    pub fn remove(&self, tenant_id: &str) -> Option<Value> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner).remove(tenant_id)
    }
}

impl PolicySource for InMemoryPolicySource {
    fn load(&self, tenant_id: &str) -> std::result::Result<Option<Value>, PolicySourceError> {
        Ok(self.documents.read().unwrap_or_else(PoisonError::into_inner).get(tenant_id).cloned())
    }
}

type CachedPolicy = Option<Arc<TenantRoutingPolicy>>;

#[derive(Debug, Default)]
struct PolicyCache {
    entries: HashMap<String, CachedPolicy>,
    /// Bumped by every write; a load that started under an older
    /// generation must not be cached.
    generation: u64,
}

/// Cache of validated tenant policies in front of a [`PolicySource`].
///
/// An entry of `None` means the tenant has no usable policy (either none
/// exists or the stored one failed validation) and platform defaults apply.
/// Entries live until [`invalidate`](Self::invalidate) or
/// [`invalidate_all`](Self::invalidate_all) is called.
pub struct TenantPolicyStore {
    source: Arc<dyn PolicySource>,
    cache: RwLock<PolicyCache>,
}

impl fmt::Debug for TenantPolicyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantPolicyStore")
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}

impl Default for TenantPolicyStore {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryPolicySource::new()))
    }
}

impl TenantPolicyStore {
    /// Creates a store reading from `source`.
    pub fn new(source: Arc<dyn PolicySource>) -> Self {
        Self {
            source,
            cache: RwLock::new(PolicyCache::default()),
        }
    }

    /// Returns the validated policy for `tenant_id`, loading it on first use.
    ///
    /// A stored policy that fails validation is logged, treated as absent
    /// and cached as such. If the cache is written (by `put` or an
    /// invalidation) while the source is being read, the loaded value is
    /// returned but not cached, so a later call sees the update.
    ///
    /// # Errors
    /// Returns the source's error if loading fails. Failures are not cached,
    /// so the next call retries.
    pub fn get(
        &self,
        tenant_id: &str,
    ) -> std::result::Result<Option<Arc<TenantRoutingPolicy>>, PolicySourceError> {
        let started = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.entries.get(tenant_id) {
                return Ok(cached.clone());
            }
            cache.generation
        };

        let loaded = match self.source.load(tenant_id)? {
            None => None,
            Some(raw) => match validate_policy(&raw, tenant_id) {
                Ok(policy) => Some(Arc::new(policy)),
                Err(e) => {
                    warn!(
                        tenant_id = %tenant_id,
                        error = %e,
                        "Rejected tenant routing policy, using platform defaults"
                    );
                    None
                }
            },
        };

        debug!(tenant_id = %tenant_id, found = loaded.is_some(), "Tenant policy loaded");

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.generation != started {
            debug!(tenant_id = %tenant_id, "Cache changed during load, not caching");
            return Ok(loaded);
        }
        cache.entries.insert(tenant_id.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Validates `raw` and caches it as the tenant's policy.
    ///
    /// # Errors
    /// Returns [`RoutingError::PolicyValidation`](crate::RoutingError::PolicyValidation)
    /// and leaves the cache untouched if the policy is invalid.
    pub fn put(&self, tenant_id: &str, raw: &Value) -> Result<Arc<TenantRoutingPolicy>> {
        let policy = Arc::new(validate_policy(raw, tenant_id)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.generation += 1;
        cache.entries.insert(tenant_id.to_string(), Some(Arc::clone(&policy)));
        drop(cache);
        debug!(tenant_id = %tenant_id, "Tenant policy replaced");
        Ok(policy)
    }

    /// Drops a tenant's cached entry. Returns whether one existed.
    pub fn invalidate(&self, tenant_id: &str) -> bool {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.generation += 1;
        cache.entries.remove(tenant_id).is_some()
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.generation += 1;
        cache.entries.clear();
    }

    /// Number of tenants currently cached.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }
}
