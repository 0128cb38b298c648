//! In-process cache of group id → group scope.
//!
//! The access gate consults this on every scoped request so that
//! authorization does not cost a database round trip per call. Lazily
//! filled; never persisted. Handlers that change a group invalidate
//! its entry synchronously before responding, so a caller re-reading
//! after a scope edit always sees the new scope enforced.
//!
//! Fills are generation-guarded: a filler snapshots the generation
//! before reading the database, and `store` drops the value if an
//! invalidation bumped the generation in between. Otherwise a slow
//! fill racing a scope edit could reinstate the old scope with
//! nothing left to evict it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    entries: HashMap<Uuid, String>,
    generation: u64,
}

/// Shared cache handle. Cloning is cheap.
#[derive(Clone, Default)]
pub struct GroupScopeCache {
    inner: Arc<RwLock<Inner>>,
}

impl GroupScopeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached scope for a group, if present. Misses are not recorded;
    /// the caller fills via [`store`](Self::store) after resolving.
    pub async fn lookup(&self, group_id: Uuid) -> Option<String> {
        self.inner.read().await.entries.get(&group_id).cloned()
    }

    /// Snapshot the current generation before resolving a miss.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Record a resolved scope. Dropped silently when an invalidation
    /// has happened since `generation` was snapshotted.
    pub async fn store(&self, group_id: Uuid, scope: String, generation: u64) {
        let mut inner = self.inner.write().await;
        if inner.generation == generation {
            inner.entries.insert(group_id, scope);
        }
    }

    pub async fn invalidate(&self, group_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(&group_id);
        inner.generation += 1;
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_store_invalidate() {
        let cache = GroupScopeCache::new();
        let id = Uuid::new_v4();

        assert_eq!(cache.lookup(id).await, None);
        let generation = cache.generation().await;
        cache.store(id, "scope1".into(), generation).await;
        assert_eq!(cache.lookup(id).await.as_deref(), Some("scope1"));

        cache.invalidate(id).await;
        assert_eq!(cache.lookup(id).await, None);
    }

    #[tokio::test]
    async fn stale_fill_is_dropped() {
        let cache = GroupScopeCache::new();
        let id = Uuid::new_v4();

        // A fill that raced an invalidation must not land.
        let generation = cache.generation().await;
        cache.invalidate(id).await;
        cache.store(id, "pre-edit scope".into(), generation).await;
        assert_eq!(cache.lookup(id).await, None);

        let generation = cache.generation().await;
        cache.store(id, "current scope".into(), generation).await;
        assert_eq!(cache.lookup(id).await.as_deref(), Some("current scope"));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = GroupScopeCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let generation = cache.generation().await;
        cache.store(a, "a".into(), generation).await;
        cache.store(b, "b".into(), generation).await;

        cache.clear().await;
        assert_eq!(cache.lookup(a).await, None);
        assert_eq!(cache.lookup(b).await, None);
    }
}
