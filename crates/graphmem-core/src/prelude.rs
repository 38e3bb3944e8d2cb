//! Convenient re-exports for downstream crates.

pub use crate::config::{MemoryConfig, TrackerConfig};
pub use crate::error::{Error, Result};
pub use crate::group::MemoryGroup;
pub use crate::heap::{array_heap_size, long_array_heap_size, shallow_size_of};
pub use crate::tracker::{EmptyMemoryTracker, MemoryTracker};
