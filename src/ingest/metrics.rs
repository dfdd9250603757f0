use super::loader::LoaderStats;
use super::worker::StealPolicy;
use crate::tokenize::TokenizerKind;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const MIB: f64 = 1024.0 * 1024.0;

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Statistics owned by a single tokenizer thread.
///
/// Only the owning thread writes these; the engine reads them after join.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadStats {
    /// 1-indexed worker id
    pub thread_id: usize,
    pub node: usize,
    pub files_processed: u64,
    pub bytes_processed: u64,
    pub tokens: u64,
    /// Buffers taken from another node's queue
    pub files_stolen: u64,
    #[serde(rename = "tokenization_secs", serialize_with = "as_secs")]
    pub tokenization_time: Duration,
}

impl ThreadStats {
    pub fn new(thread_id: usize, node: usize) -> Self {
        Self {
            thread_id,
            node,
            ..Default::default()
        }
    }
}

/// Run-wide totals, one lock per counter
#[derive(Debug, Default)]
pub struct GlobalCounters {
    total_bytes: Mutex<u64>,
    total_tokens: Mutex<u64>,
}

impl GlobalCounters {
    pub fn add_bytes(&self, bytes: u64) {
        *self.total_bytes.lock().unwrap_or_else(PoisonError::into_inner) += bytes;
    }

    pub fn add_tokens(&self, tokens: u64) {
        *self.total_tokens.lock().unwrap_or_else(PoisonError::into_inner) += tokens;
    }

    pub fn total_bytes(&self) -> u64 {
        *self.total_bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn total_tokens(&self) -> u64 {
        *self.total_tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Final result of one `index_files` run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub root: PathBuf,
    pub strategy: TokenizerKind,
    pub steal_policy: StealPolicy,
    pub node_count: usize,
    pub num_threads: usize,

    pub files_crawled: u64,
    /// Sum of crawled file sizes
    pub dataset_bytes: u64,
    pub files_loaded: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    /// Buffers still queued after phase 2 (nodes without a worker)
    pub files_unprocessed: u64,

    pub loaders: Vec<LoaderStats>,
    pub threads: Vec<ThreadStats>,

    pub total_bytes: u64,
    pub total_tokens: u64,

    #[serde(rename = "load_secs", serialize_with = "as_secs")]
    pub load_time: Duration,
    /// From the first worker spawn to the last worker join
    #[serde(rename = "tokenize_secs", serialize_with = "as_secs")]
    pub tokenize_time: Duration,
    pub throughput_mib_s: f64,
}

impl IngestReport {
    /// Worker with the longest tokenization time; ties go to the lowest id
    pub fn slowest_thread(&self) -> Option<&ThreadStats> {
        slowest(&self.threads)
    }
}

pub fn slowest(threads: &[ThreadStats]) -> Option<&ThreadStats> {
    threads
        .iter()
        .filter(|t| t.files_processed > 0)
        .fold(None, |best: Option<&ThreadStats>, t| match best {
            Some(b) if b.tokenization_time >= t.tokenization_time => Some(b),
            _ => Some(t),
        })
}

/// Bytes per second expressed in MiB/s; zero when no time elapsed
pub fn throughput_mib_s(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / MIB / secs
    } else {
        0.0
    }
}
