//! Abstract memory tracker interface.
//!
//! The concrete batching implementation lives in `graphmem-mem`. We keep only
//! the trait here so collections can depend on the API without pulling in
//! pools or atomics.

use crate::error::Result;

/// A per-scope accounting handle (one transaction, one operator, one test).
///
/// Methods take `&self` so that several collections owned by the same scope
/// can report through one shared reference. Implementations are meant for a
/// single thread at a time and are typically `!Sync`.
///
/// Invariants:
/// - `estimated_heap_memory()` equals the sum of `allocate_heap` minus
///   `release_heap` calls made since the last `reset()`.
/// - After `close()` every method is a no-op except `allocate_heap`, which
///   fails with `Error::TrackerClosed`.
pub trait MemoryTracker {
    /// Account for `bytes` more heap. On error nothing has been applied.
    fn allocate_heap(&self, bytes: u64) -> Result<()>;

    /// Give back `bytes` previously allocated through this tracker.
    ///
    /// # Panics
    /// Releasing more than is currently allocated is a bookkeeping bug and
    /// panics rather than clamping.
    fn release_heap(&self, bytes: u64);

    /// Exact live heap attributed to this tracker.
    fn estimated_heap_memory(&self) -> u64;

    /// Highest value `estimated_heap_memory()` reached since the last reset.
    fn heap_high_water_mark(&self) -> u64;

    /// Zero local usage and return all reserved quota to the pool; the
    /// tracker stays usable.
    fn reset(&self);

    /// Like `reset()`, then permanently inert.
    fn close(&self);
}

impl<T: MemoryTracker + ?Sized> MemoryTracker for &T {
    fn allocate_heap(&self, bytes: u64) -> Result<()> {
        (**self).allocate_heap(bytes)
    }
    fn release_heap(&self, bytes: u64) {
        (**self).release_heap(bytes)
    }
    fn estimated_heap_memory(&self) -> u64 {
        (**self).estimated_heap_memory()
    }
    fn heap_high_water_mark(&self) -> u64 {
        (**self).heap_high_water_mark()
    }
    fn reset(&self) {
        (**self).reset()
    }
    fn close(&self) {
        (**self).close()
    }
}

/// Tracker that accepts everything and records nothing.
///
/// For call sites that opt out of accounting; it never fails and always
/// reports zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyMemoryTracker;

impl EmptyMemoryTracker {
    pub const INSTANCE: EmptyMemoryTracker = EmptyMemoryTracker;
}

impl MemoryTracker for EmptyMemoryTracker {
    fn allocate_heap(&self, _bytes: u64) -> Result<()> {
        Ok(())
    }
    fn release_heap(&self, _bytes: u64) {}
    fn estimated_heap_memory(&self) -> u64 {
        0
    }
    fn heap_high_water_mark(&self) -> u64 {
        0
    }
    fn reset(&self) {}
    fn close(&self) {}
}
