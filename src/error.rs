//! Error types for nidx
//!
//! Every failure inside the pipeline is scoped to one unit of work (a file,
//! a thread's affinity attempt, a directory entry). Those errors are logged
//! where they happen and the run carries on; only configuration errors stop
//! a run before it starts.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for engine operations
#[derive(Error, Debug)]
pub enum IngestError {
    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A mutating tokenizer was asked to run over a buffer it already rewrote
    #[error("Buffer for '{}' was already tokenized in place", path.display())]
    AlreadyTokenized { path: PathBuf },

    /// Failed to spawn a pipeline thread
    #[error("Failed to spawn {role} thread {id}: {reason}")]
    Spawn {
        role: &'static str,
        id: usize,
        reason: String,
    },
}

/// Configuration errors, rejected before any pipeline work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Number of threads must be a positive integer, got {0}")]
    InvalidThreadCount(usize),

    #[error("Number of threads {requested} exceeds the supported maximum of {max}")]
    TooManyThreads { requested: usize, max: usize },

    #[error("Affinity flag must be 0 (disable) or 1 (enable), got {0}")]
    InvalidAffinityFlag(u8),

    #[error("Unknown tokenizer strategy '{0}' (expected branchless, pattern or delimiter)")]
    UnknownStrategy(String),

    #[error("Unknown steal policy '{0}' (expected local or cross-node)")]
    UnknownStealPolicy(String),

    #[error("Simulated node count must be at least 1, got {0}")]
    InvalidNodeCount(usize),
}

/// NUMA topology and affinity errors (always non-fatal)
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The system exposes no NUMA information
    #[error("NUMA topology is not available on this system")]
    Unavailable,

    /// Node id outside the detected topology
    #[error("Unknown NUMA node {node} (have {node_count})")]
    UnknownNode { node: usize, node_count: usize },

    /// The node exists but lists no CPUs
    #[error("NUMA node {0} has no CPUs")]
    EmptyCpuSet(usize),

    /// sched_setaffinity failed
    #[error("Failed to set thread affinity: {0}")]
    Affinity(#[source] std::io::Error),

    /// Affinity is not implemented on this platform
    #[error("Thread affinity is not supported on this platform")]
    Unsupported,
}

/// Errors loading a single file into memory
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Error opening file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading file '{}': expected {expected} bytes, read {actual}", path.display())]
    ShortRead {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl LoadError {
    /// Path of the file that failed to load
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Open { path, .. }
            | LoadError::Read { path, .. }
            | LoadError::ShortRead { path, .. } => path,
        }
    }
}

/// Result type alias for engine operations
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: IngestError = ConfigError::InvalidThreadCount(0).into();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_short_read_message() {
        let err = LoadError::ShortRead {
            path: PathBuf::from("/data/a.txt"),
            expected: 10,
            actual: 4,
        };
        assert_eq!(err.path(), std::path::Path::new("/data/a.txt"));
        assert!(err.to_string().contains("expected 10 bytes, read 4"));
    }
}
