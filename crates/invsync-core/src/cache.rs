//! Membership cache snapshots
//!
//! Validation consults a read-mostly snapshot of known datacenters and
//! known `datacenter@node` pairs. The snapshot is replaced wholesale on
//! each refresh, never mutated field-by-field, so readers under the
//! read lock always see a fully consistent view.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// One consistent view of the membership cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Known datacenter names
    pub datacenters: HashSet<String>,
    /// Known nodes, keyed as `datacenter@node`
    pub nodes: HashSet<String>,
    /// Set when the cache source is unreachable or not yet built;
    /// membership checks fail open while this is set
    pub unavailable: bool,
}

impl CacheSnapshot {
    /// Empty snapshot marked unavailable, the state before the first
    /// successful refresh.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Membership key for a node within a datacenter.
    pub fn node_key(datacenter: &str, node: &str) -> String {
        format!("{datacenter}@{node}")
    }

    /// Copy of this snapshot with the unavailable flag raised. Used by
    /// the refresh loop to fail open while keeping the last known sets.
    pub fn into_unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

/// Shared handle to the current cache snapshot.
///
/// Many concurrent validations read; one refresh loop writes. The
/// writer always swaps in a complete new snapshot.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    inner: Arc<RwLock<CacheSnapshot>>,
}

impl SharedCache {
    /// Create a cache that starts unavailable (fail-open) until the
    /// first refresh succeeds.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheSnapshot::unavailable())),
        }
    }

    /// Acquire a read guard on the current snapshot.
    pub async fn read(&self) -> RwLockReadGuard<'_, CacheSnapshot> {
        self.inner.read().await
    }

    /// Replace the snapshot wholesale under the write lock.
    pub async fn replace(&self, snapshot: CacheSnapshot) {
        *self.inner.write().await = snapshot;
    }

    /// Clone of the current snapshot.
    pub async fn snapshot(&self) -> CacheSnapshot {
        self.inner.read().await.clone()
    }
}

/// Cache builder serving a fixed snapshot, typically assembled from
/// configuration. Single-instance deployments and tests use it in
/// place of a live inventory-backed builder.
#[derive(Debug, Clone, Default)]
pub struct StaticCacheBuilder {
    snapshot: CacheSnapshot,
}

impl StaticCacheBuilder {
    /// Build from datacenter names and `datacenter@node` keys
    pub fn new(
        datacenters: impl IntoIterator<Item = String>,
        nodes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            snapshot: CacheSnapshot {
                datacenters: datacenters.into_iter().collect(),
                nodes: nodes.into_iter().collect(),
                unavailable: false,
            },
        }
    }
}

#[async_trait::async_trait]
impl crate::traits::CacheBuilder for StaticCacheBuilder {
    async fn build(&self) -> Result<CacheSnapshot, crate::Error> {
        Ok(self.snapshot.clone())
    }

    fn builder_name(&self) -> &'static str {
        "static"
    }
}
