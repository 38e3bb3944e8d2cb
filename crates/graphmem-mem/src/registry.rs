//! Group -> pool registry.
//!
//! One `MemoryPools` value is the process-wide owner of every pool. It is an
//! ordinary object rather than a global so tests can build isolated
//! registries, and it carries the tracker settings handed to new trackers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use graphmem_core::config::{MemoryConfig, TrackerConfig, UNLIMITED};
use graphmem_core::group::MemoryGroup;

use crate::pool::MemoryPool;
use crate::tracker::LocalMemoryTracker;

#[derive(Debug, Default)]
pub struct MemoryPools {
    pools: Mutex<HashMap<MemoryGroup, Arc<MemoryPool>>>,
    tracker_config: TrackerConfig,
}

impl MemoryPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard hierarchy: a `Global` root and the
    /// `Transaction`, `Query` and `Other` pools chained beneath it.
    pub fn bootstrap(cfg: &MemoryConfig) -> Self {
        let pools = Self {
            pools: Mutex::new(HashMap::new()),
            tracker_config: cfg.tracker_config(),
        };
        let global = pools.pool(MemoryGroup::Global, cfg.global_max_bytes, None);
        pools.pool(MemoryGroup::Transaction, cfg.transaction_max_bytes, Some(&global));
        pools.pool(MemoryGroup::Query, cfg.query_max_bytes, Some(&global));
        pools.pool(MemoryGroup::Other, UNLIMITED, Some(&global));
        pools
    }

    /// Get the pool for `group`, creating it with `limit` and `parent` if it
    /// does not exist yet. The first caller wins; later callers get the
    /// existing pool whatever arguments they pass.
    pub fn pool(
        &self,
        group: MemoryGroup,
        limit: u64,
        parent: Option<&Arc<MemoryPool>>,
    ) -> Arc<MemoryPool> {
        let mut pools = self.lock();
        let pool = pools.entry(group).or_insert_with(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                group = %group,
                limit,
                parent = ?parent.map(|p| p.group()),
                "created memory pool"
            );
            Arc::new(MemoryPool::new(group, limit, parent))
        });
        Arc::clone(pool)
    }

    pub fn get(&self, group: MemoryGroup) -> Option<Arc<MemoryPool>> {
        self.lock().get(&group).cloned()
    }

    /// Snapshot of every pool, ordered by group.
    pub fn pools(&self) -> Vec<Arc<MemoryPool>> {
        let mut out: Vec<_> = self.lock().values().cloned().collect();
        out.sort_by_key(|p| p.group());
        out
    }

    /// Bytes reserved across root pools. Child usage is already contained in
    /// its ancestors, so only pools without a live parent are summed.
    pub fn total_used_heap(&self) -> u64 {
        self.lock()
            .values()
            .filter(|p| p.parent().is_none())
            .map(|p| p.used_heap())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        self.tracker_config
    }

    /// New tracker against `group`'s pool, or `None` if no such pool exists.
    pub fn tracker(&self, group: MemoryGroup) -> Option<LocalMemoryTracker> {
        self.get(group)
            .map(|pool| LocalMemoryTracker::with_config(pool, self.tracker_config))
    }

    /// Drop every pool. Trackers still holding a pool keep it alive, but it is
    /// no longer reachable through this registry.
    pub fn teardown(&self) {
        let mut pools = self.lock();
        #[cfg(feature = "tracing")]
        tracing::debug!(pools = pools.len(), "tearing down memory pools");
        pools.clear();
    }

    // The map is only ever inserted into or cleared wholesale, so a poisoned
    // lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<MemoryGroup, Arc<MemoryPool>>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
