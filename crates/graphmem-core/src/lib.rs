#![forbid(unsafe_code)]
//! graphmem-core: shared vocabulary for heap accounting.
//!
//! Memory groups, the `MemoryTracker` interface, closed-form heap size
//! estimation, configuration and errors. Concrete pools and trackers live in
//! `graphmem-mem`; self-accounting collections live in `graphmem-collections`.

pub mod config;
pub mod error;
pub mod group;
pub mod heap;
pub mod prelude;
pub mod tracker;

pub use config::{MemoryConfig, TrackerConfig};
pub use error::{Error, Result};
pub use group::MemoryGroup;
pub use tracker::{EmptyMemoryTracker, MemoryTracker};
