//! Memory groups: identity tags for bounded classes of heap usage.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryGroup {
    /// Process-wide aggregate; parent of the other groups after bootstrap.
    Global,
    Transaction,
    Query,
    Other,
}

impl MemoryGroup {
    pub const ALL: [MemoryGroup; 4] = [
        MemoryGroup::Global,
        MemoryGroup::Transaction,
        MemoryGroup::Query,
        MemoryGroup::Other,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            MemoryGroup::Global => "global",
            MemoryGroup::Transaction => "transaction",
            MemoryGroup::Query => "query",
            MemoryGroup::Other => "other",
        }
    }
}

impl fmt::Display for MemoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
