#![forbid(unsafe_code)]
//! graphmem: heap accounting for transactional graph workloads.
//!
//! Facade over the workspace crates:
//! - `core`: memory groups, the `MemoryTracker` trait, heap size functions, config.
//! - `mem`: `MemoryPool`, the `MemoryPools` registry, `LocalMemoryTracker`.
//! - `collections`: self-accounting collections.

pub use graphmem_collections as collections;
pub use graphmem_core as core;
pub use graphmem_mem as mem;

pub use graphmem_collections::{HeapTrackingArrayList, HeapTrackingLongHashSet};
pub use graphmem_core::{Error, MemoryConfig, MemoryGroup, MemoryTracker, Result};
pub use graphmem_mem::{LocalMemoryTracker, MemoryPool, MemoryPools};
