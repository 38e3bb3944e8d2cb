use thiserror::Error;

/// Canonical result for heap accounting.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A pool (named by its memory group) or a tracker's local limit rejected
    /// a reservation. Nothing was applied; the caller must unwind.
    #[error("memory limit exceeded for {scope}: requested {requested} bytes, limit {limit}, used {used}")]
    MemoryLimitExceeded {
        scope: String,
        requested: u64,
        limit: u64,
        used: u64,
    },

    #[error("memory tracker is closed")]
    TrackerClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Error::MemoryLimitExceeded { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
