#![forbid(unsafe_code)]
//! graphmem-mem: limit-enforcing pools and batching local trackers.
//!
//! This crate provides the concrete implementation of the `MemoryTracker`
//! interface defined in `graphmem-core::tracker`. Pools are the only state
//! shared between threads and are updated with atomics; trackers are
//! single-owner and reserve from their pool in chunks.
//!
//! The `MemoryPools` registry is an explicit context object. Create one per
//! process (or per test) and hand it to whoever needs trackers.

pub mod pool;
pub mod registry;
pub mod tracker;
pub mod tracking;

pub use graphmem_core::error::{Error, Result};
pub use pool::MemoryPool;
pub use registry::MemoryPools;
pub use tracker::LocalMemoryTracker;
pub use tracking::PeakTracker;
