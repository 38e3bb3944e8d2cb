//! Limit-enforcing memory pool with optional parent delegation.
//!
//! A pool is a shared atomic byte counter for one `MemoryGroup`. Reservations
//! are accepted only if they fit under this pool's limit *and* under every
//! ancestor's limit; a rejection at any level rolls back the levels already
//! applied, so callers never observe a partial reservation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use graphmem_core::config::UNLIMITED;
use graphmem_core::error::{Error, Result};
use graphmem_core::group::MemoryGroup;

use crate::tracking::PeakTracker;

#[derive(Debug)]
pub struct MemoryPool {
    group: MemoryGroup,
    limit: u64,
    used: AtomicU64,
    peak: PeakTracker,
    // Non-owning: the registry owns the parent. A torn-down parent is no
    // longer enforced.
    parent: Option<Weak<MemoryPool>>,
}

impl MemoryPool {
    /// Create a pool. `limit == 0` means unlimited.
    pub fn new(group: MemoryGroup, limit: u64, parent: Option<&Arc<MemoryPool>>) -> Self {
        Self {
            group,
            limit,
            used: AtomicU64::new(0),
            peak: PeakTracker::new(),
            parent: parent.map(Arc::downgrade),
        }
    }

    pub fn group(&self) -> MemoryGroup {
        self.group
    }

    /// Configured limit; 0 means unlimited.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == UNLIMITED
    }

    pub fn parent(&self) -> Option<Arc<MemoryPool>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Point-in-time snapshot of reserved bytes.
    pub fn used_heap(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    /// Bytes still available under this pool's own limit (`u64::MAX` when
    /// unlimited). Ancestors may be tighter.
    pub fn free_heap(&self) -> u64 {
        if self.is_unlimited() {
            u64::MAX
        } else {
            self.limit.saturating_sub(self.used_heap())
        }
    }

    /// Highest `used_heap()` this pool has reached.
    pub fn peak_heap(&self) -> u64 {
        self.peak.peak()
    }

    /// Atomically add `bytes` here and in every ancestor, or nowhere.
    pub fn reserve(&self, bytes: u64) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        let now = self.try_reserve_local(bytes)?;
        if let Some(parent) = self.parent() {
            if let Err(e) = parent.reserve(bytes) {
                self.release_local(bytes);
                return Err(e);
            }
        }
        self.peak.record_used(now);
        Ok(())
    }

    /// Subtract `bytes` here and in every ancestor.
    ///
    /// # Panics
    /// If `bytes` exceeds what is currently reserved. That is an accounting
    /// bug in the caller and is never clamped.
    pub fn release(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        self.release_local(bytes);
        if let Some(parent) = self.parent() {
            parent.release(bytes);
        }
    }

    fn try_reserve_local(&self, bytes: u64) -> Result<u64> {
        loop {
            let cur = self.used.load(Ordering::Acquire);
            let next = match cur.checked_add(bytes) {
                Some(next) if self.is_unlimited() || next <= self.limit => next,
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        group = %self.group,
                        requested = bytes,
                        limit = self.limit,
                        used = cur,
                        "pool rejected reservation"
                    );
                    return Err(Error::MemoryLimitExceeded {
                        scope: format!("{} pool", self.group),
                        requested: bytes,
                        limit: self.limit,
                        used: cur,
                    });
                }
            };
            if self
                .used
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(next);
            }
        }
    }

    fn release_local(&self, bytes: u64) {
        let res = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| cur.checked_sub(bytes));
        if let Err(cur) = res {
            panic!(
                "invalid release of {bytes} bytes from {} pool holding {cur} bytes",
                self.group
            );
        }
    }
}
