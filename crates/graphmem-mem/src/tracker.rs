//! Batching local tracker.
//!
//! A `LocalMemoryTracker` keeps exact per-scope usage in plain cells and only
//! touches its pool's shared atomic when local quota runs out (a "grab") or
//! when too much idle quota piles up (a "trim"). Grabs start at
//! `TrackerConfig::grab_bytes` and double on each consecutive grab up to
//! `max_grab_bytes`, so a scope that allocates fast contends less.
//!
//! Invariants:
//! - `used <= reserved`, and `reserved` is always counted in the pool.
//! - `used` never goes negative; over-release panics.
//! - A rejected allocation leaves `used` and `reserved` unchanged.

use std::cell::Cell;
use std::sync::Arc;

use graphmem_core::config::{TrackerConfig, UNLIMITED};
use graphmem_core::error::{Error, Result};
use graphmem_core::tracker::MemoryTracker;

use crate::pool::MemoryPool;

#[derive(Debug)]
pub struct LocalMemoryTracker {
    pool: Arc<MemoryPool>,
    local_limit: u64,
    min_chunk: u64,
    max_chunk: u64,
    chunk: Cell<u64>,
    reserved: Cell<u64>,
    used: Cell<u64>,
    high_water_mark: Cell<u64>,
    closed: Cell<bool>,
}

impl LocalMemoryTracker {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        Self::with_config(pool, TrackerConfig::default())
    }

    pub fn with_config(pool: Arc<MemoryPool>, config: TrackerConfig) -> Self {
        let min_chunk = config.grab_bytes.max(1);
        Self {
            pool,
            local_limit: config.local_max_bytes,
            min_chunk,
            max_chunk: config.max_grab_bytes.max(min_chunk),
            chunk: Cell::new(min_chunk),
            reserved: Cell::new(0),
            used: Cell::new(0),
            high_water_mark: Cell::new(0),
            closed: Cell::new(false),
        }
    }

    pub fn pool(&self) -> &Arc<MemoryPool> {
        &self.pool
    }

    /// Quota currently held from the pool (always `>= estimated_heap_memory()`).
    pub fn reserved_heap(&self) -> u64 {
        self.reserved.get()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn grab(&self, shortfall: u64) -> Result<()> {
        let chunk = self.chunk.get();
        let want = shortfall.max(chunk);
        let got = match self.pool.reserve(want) {
            Ok(()) => {
                self.chunk.set(chunk.saturating_mul(2).min(self.max_chunk));
                want
            }
            // A full chunk did not fit; the exact need still might.
            Err(_) if want > shortfall => {
                self.pool.reserve(shortfall)?;
                shortfall
            }
            Err(e) => return Err(e),
        };
        self.reserved.set(self.reserved.get() + got);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            group = %self.pool.group(),
            grabbed = got,
            reserved = self.reserved.get(),
            "tracker grabbed quota"
        );
        Ok(())
    }

    fn trim(&self) {
        let reserved = self.reserved.get();
        let slack = reserved - self.used.get();
        let keep = self.chunk.get();
        if slack > keep.saturating_mul(2) {
            let give = slack - keep;
            self.pool.release(give);
            self.reserved.set(reserved - give);
            #[cfg(feature = "tracing")]
            tracing::trace!(
                group = %self.pool.group(),
                returned = give,
                reserved = reserved - give,
                "tracker trimmed idle quota"
            );
        }
    }
}

impl MemoryTracker for LocalMemoryTracker {
    fn allocate_heap(&self, bytes: u64) -> Result<()> {
        if self.closed.get() {
            return Err(Error::TrackerClosed);
        }
        if bytes == 0 {
            return Ok(());
        }
        let used = self.used.get();
        let next = match used.checked_add(bytes) {
            Some(next) if self.local_limit == UNLIMITED || next <= self.local_limit => next,
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    requested = bytes,
                    limit = self.local_limit,
                    used,
                    "tracker rejected allocation"
                );
                return Err(Error::MemoryLimitExceeded {
                    scope: "local tracker".into(),
                    requested: bytes,
                    limit: self.local_limit,
                    used,
                });
            }
        };
        let reserved = self.reserved.get();
        if next > reserved {
            self.grab(next - reserved)?;
        }
        self.used.set(next);
        if next > self.high_water_mark.get() {
            self.high_water_mark.set(next);
        }
        Ok(())
    }

    fn release_heap(&self, bytes: u64) {
        if self.closed.get() {
            return;
        }
        let used = self.used.get();
        match used.checked_sub(bytes) {
            Some(next) => self.used.set(next),
            None => panic!("invalid release of {bytes} bytes from tracker using {used} bytes"),
        }
        self.trim();
    }

    fn estimated_heap_memory(&self) -> u64 {
        self.used.get()
    }

    fn heap_high_water_mark(&self) -> u64 {
        self.high_water_mark.get()
    }

    /// Live collections must be closed first; releasing through a reset
    /// tracker panics.
    fn reset(&self) {
        if self.closed.get() {
            return;
        }
        self.pool.release(self.reserved.get());
        self.reserved.set(0);
        self.used.set(0);
        self.high_water_mark.set(0);
        self.chunk.set(self.min_chunk);
    }

    fn close(&self) {
        self.reset();
        self.closed.set(true);
    }
}

impl Drop for LocalMemoryTracker {
    fn drop(&mut self) {
        self.close();
    }
}
