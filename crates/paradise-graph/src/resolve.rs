//! External id → store handle resolution.

use std::sync::Arc;

use dashmap::DashMap;

use paradise_core::{ExternalId, NodeHandle};

use crate::client::{GraphConfig, GraphError, Result};
use crate::retry::{with_read_retry, RetryPolicy};
use crate::store::GraphStore;

/// Maps external ids to store handles.
///
/// Every resolution is a point lookup unless the cache is enabled. Cached
/// entries live until the process exits; once `capacity` entries are held,
/// further resolutions still succeed but are not cached.
pub struct Resolver {
    store: Arc<dyn GraphStore>,
    cache: DashMap<ExternalId, NodeHandle>,
    capacity: usize,
    retry: RetryPolicy,
}

impl Resolver {
    /// A resolver with no cache and no retry.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            capacity: 0,
            retry: RetryPolicy::NONE,
        }
    }

    pub fn from_config(store: Arc<dyn GraphStore>, config: &GraphConfig) -> Self {
        Self::new(store)
            .with_cache(config.resolver_cache_capacity)
            .with_retry(RetryPolicy::from_config(config))
    }

    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve one external id. Exactly one node must carry it.
    pub async fn resolve(&self, id: ExternalId) -> Result<NodeHandle> {
        if let Some(handle) = self.cache.get(&id) {
            return Ok(handle.value().clone());
        }

        let mut handles =
            with_read_retry(self.retry, "resolve", || self.store.find_handles(id)).await?;

        let handle = match handles.len() {
            0 => return Err(GraphError::NotFound { id }),
            1 => handles.remove(0),
            matches => return Err(GraphError::AmbiguousRecord { id, matches }),
        };

        if self.cache.len() < self.capacity {
            self.cache.insert(id, handle.clone());
        }
        tracing::debug!(%id, %handle, "Resolved external id");
        Ok(handle)
    }

    /// Number of cached resolutions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }
}
