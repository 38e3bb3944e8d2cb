#![forbid(unsafe_code)]
//! graphmem-collections: collections that account for their own heap.
//!
//! Each collection computes its exact footprint (shallow struct size plus
//! backing storage) from the closed-form functions in `graphmem_core::heap`
//! and reports every change to a borrowed `MemoryTracker`. The tracker is
//! charged *before* new storage is allocated, so a `MemoryLimitExceeded`
//! leaves the collection exactly as it was. Dropping (or `close()`-ing) a
//! collection releases everything it reported.

pub mod array_list;
pub mod long_hash_set;

pub use array_list::HeapTrackingArrayList;
pub use long_hash_set::HeapTrackingLongHashSet;
