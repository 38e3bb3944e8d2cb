//! Heap accounting configuration that the engine can serialize/deserialize.
//!
//! Byte limits use 0 for "unlimited". A zero-byte budget is not expressible;
//! a group that must never allocate should not get a pool at all.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const UNLIMITED: u64 = 0;

/// Default tracker chunk: enough for a few hundred small collection resizes
/// before the tracker touches the shared pool counter again.
pub const DEFAULT_GRAB_BYTES: u64 = 8 * 1024;
pub const DEFAULT_MAX_GRAB_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Cap across all groups (the `Global` pool).
    pub global_max_bytes: u64,

    /// Cap on the `Transaction` pool.
    pub transaction_max_bytes: u64,

    /// Cap on the `Query` pool.
    pub query_max_bytes: u64,

    /// Cap on a single tracker, independent of its pool.
    pub tracker_local_max_bytes: u64,

    /// First chunk a tracker grabs from its pool.
    pub tracker_grab_bytes: u64,

    /// Upper bound for the adaptive chunk.
    pub tracker_max_grab_bytes: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            global_max_bytes: UNLIMITED,
            transaction_max_bytes: UNLIMITED,
            query_max_bytes: UNLIMITED,
            tracker_local_max_bytes: UNLIMITED,
            tracker_grab_bytes: DEFAULT_GRAB_BYTES,
            tracker_max_grab_bytes: DEFAULT_MAX_GRAB_BYTES,
        }
    }
}

/// Per-tracker settings, snapshotted from `MemoryConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub local_max_bytes: u64,
    pub grab_bytes: u64,
    pub max_grab_bytes: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        MemoryConfig::default().tracker_config()
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grab_bytes == 0 {
            return Err(Error::Config("tracker grab size must be positive".into()));
        }
        if self.grab_bytes > self.max_grab_bytes {
            return Err(Error::Config(format!(
                "tracker grab size {} exceeds max grab size {}",
                self.grab_bytes, self.max_grab_bytes
            )));
        }
        Ok(())
    }
}

impl MemoryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `GRAPHMEM_GLOBAL_MAX_BYTES`
    /// - `GRAPHMEM_TRANSACTION_MAX_BYTES`
    /// - `GRAPHMEM_QUERY_MAX_BYTES`
    /// - `GRAPHMEM_TRACKER_LOCAL_MAX_BYTES`
    /// - `GRAPHMEM_TRACKER_GRAB_BYTES`
    /// - `GRAPHMEM_TRACKER_MAX_GRAB_BYTES`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        let vars: [(&str, &mut u64); 6] = [
            ("GRAPHMEM_GLOBAL_MAX_BYTES", &mut cfg.global_max_bytes),
            ("GRAPHMEM_TRANSACTION_MAX_BYTES", &mut cfg.transaction_max_bytes),
            ("GRAPHMEM_QUERY_MAX_BYTES", &mut cfg.query_max_bytes),
            ("GRAPHMEM_TRACKER_LOCAL_MAX_BYTES", &mut cfg.tracker_local_max_bytes),
            ("GRAPHMEM_TRACKER_GRAB_BYTES", &mut cfg.tracker_grab_bytes),
            ("GRAPHMEM_TRACKER_MAX_GRAB_BYTES", &mut cfg.tracker_max_grab_bytes),
        ];
        for (key, slot) in vars {
            if let Ok(s) = std::env::var(key) {
                if let Ok(v) = s.trim().parse::<u64>() {
                    *slot = v;
                }
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker_config().validate()
    }

    /// Produce the per-tracker configuration snapshot.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            local_max_bytes: self.tracker_local_max_bytes,
            grab_bytes: self.tracker_grab_bytes,
            max_grab_bytes: self.tracker_max_grab_bytes,
        }
    }
}
