//! Phase 2: node-affinitized tokenizer workers.
//!
//! Worker `i` (1-indexed) serves node `(i - 1) % node_count` for its whole run.
//! It pops buffers from that node's queue until the queue is empty, then exits.
//! With [`StealPolicy::CrossNode`] it first drains the other nodes' queues.

use super::metrics::{GlobalCounters, ThreadStats};
use super::queue::{LoadedBuffer, NodeQueues};
use crate::error::{ConfigError, IngestError};
use crate::numa::{pin_to_node, Topology};
use crate::tokenize::Tokenizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error};

/// What a worker does once its own node's queue is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StealPolicy {
    /// Exit. Work left on other nodes stays with their workers.
    #[default]
    LocalOnly,
    /// Pull from other nodes' queues before exiting
    CrossNode,
}

impl fmt::Display for StealPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StealPolicy::LocalOnly => "local",
            StealPolicy::CrossNode => "cross-node",
        })
    }
}

impl FromStr for StealPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "local-only" | "none" => Ok(StealPolicy::LocalOnly),
            "cross-node" | "cross" | "steal" => Ok(StealPolicy::CrossNode),
            other => Err(ConfigError::UnknownStealPolicy(other.to_string())),
        }
    }
}

/// Static node for a 1-indexed worker
pub fn assign_node(thread_id: usize, node_count: usize) -> usize {
    (thread_id.saturating_sub(1)) % node_count.max(1)
}

/// Shared handles and settings for one worker
pub struct WorkerContext {
    pub thread_id: usize,
    pub queues: Arc<NodeQueues>,
    pub counters: Arc<GlobalCounters>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub topology: Arc<dyn Topology>,
    pub affinity: bool,
    pub steal: StealPolicy,
}

impl WorkerContext {
    pub fn node(&self) -> usize {
        assign_node(self.thread_id, self.queues.node_count())
    }
}

/// Spawn a tokenizer worker thread
pub fn spawn_worker(ctx: WorkerContext) -> Result<JoinHandle<ThreadStats>, IngestError> {
    let id = ctx.thread_id;
    thread::Builder::new()
        .name(format!("tokenizer-{}", id))
        .spawn(move || run_worker(ctx))
        .map_err(|e| IngestError::Spawn {
            role: "tokenizer",
            id,
            reason: e.to_string(),
        })
}

/// Worker body; runs on the calling thread
pub fn run_worker(ctx: WorkerContext) -> ThreadStats {
    let node = ctx.node();
    let mut stats = ThreadStats::new(ctx.thread_id, node);

    if ctx.affinity {
        pin_to_node(ctx.topology.as_ref(), "tokenizer", ctx.thread_id, node);
    }

    while let Some(buffer) = next_buffer(&ctx, node, &mut stats) {
        process_buffer(&ctx, buffer, &mut stats);
    }

    debug!(
        thread = ctx.thread_id,
        node,
        files = stats.files_processed,
        bytes = stats.bytes_processed,
        secs = stats.tokenization_time.as_secs_f64(),
        "tokenizer finished"
    );
    stats
}

fn next_buffer(ctx: &WorkerContext, node: usize, stats: &mut ThreadStats) -> Option<LoadedBuffer> {
    if let Some(buffer) = ctx.queues.pop(node) {
        return Some(buffer);
    }
    match ctx.steal {
        StealPolicy::LocalOnly => None,
        StealPolicy::CrossNode => {
            let (victim, buffer) = ctx.queues.steal(node)?;
            stats.files_stolen += 1;
            debug!(thread = ctx.thread_id, node, victim, "stole buffer");
            Some(buffer)
        }
    }
}

fn process_buffer(ctx: &WorkerContext, mut buffer: LoadedBuffer, stats: &mut ThreadStats) {
    let size = buffer.size_bytes();
    ctx.counters.add_bytes(size);
    stats.bytes_processed += size;

    let start = Instant::now();
    let result = buffer.tokenize_with(ctx.tokenizer.as_ref());
    let elapsed = start.elapsed();

    match result {
        Ok(tokens) => {
            let count = tokens.len() as u64;
            ctx.counters.add_tokens(count);
            stats.tokens += count;
        }
        Err(e) => error!(thread = ctx.thread_id, "{}", e),
    }
    stats.files_processed += 1;

    // Release the file content now rather than at the next pop
    drop(buffer);

    stats.tokenization_time += elapsed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numa::StaticTopology;
    use crate::tokenize::{ClassificationTable, TokenizerKind};

    fn context(thread_id: usize, queues: &Arc<NodeQueues>, steal: StealPolicy) -> WorkerContext {
        let table = Arc::new(ClassificationTable::alphanumeric());
        WorkerContext {
            thread_id,
            queues: Arc::clone(queues),
            counters: Arc::new(GlobalCounters::default()),
            tokenizer: TokenizerKind::Branchless.build(table),
            topology: Arc::new(StaticTopology::uniform(queues.node_count(), 4)),
            affinity: true,
            steal,
        }
    }

    fn push(queues: &NodeQueues, node: usize, content: &[u8]) {
        queues.push(node, LoadedBuffer::new("f", content.to_vec().into_boxed_slice()));
    }

    #[test]
    fn test_round_robin_assignment() {
        assert_eq!(assign_node(1, 2), 0);
        assert_eq!(assign_node(2, 2), 1);
        assert_eq!(assign_node(3, 2), 0);
        assert_eq!(assign_node(4, 1), 0);
        assert_eq!(assign_node(1, 0), 0);
    }

    #[test]
    fn test_worker_drains_own_node_only() {
        let queues = Arc::new(NodeQueues::new(2));
        push(&queues, 0, b"ab cd");
        push(&queues, 0, b"");
        push(&queues, 1, b"other node");

        let ctx = context(1, &queues, StealPolicy::LocalOnly);
        let counters = Arc::clone(&ctx.counters);
        let stats = run_worker(ctx);

        assert_eq!(stats.node, 0);
        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.bytes_processed, 5);
        assert_eq!(stats.tokens, 2);
        assert_eq!(stats.files_stolen, 0);
        assert_eq!(counters.total_bytes(), 5);
        assert_eq!(counters.total_tokens(), 2);
        assert_eq!(queues.len(1), 1);
    }

    #[test]
    fn test_cross_node_steal_drains_everything() {
        let queues = Arc::new(NodeQueues::new(3));
        push(&queues, 0, b"a");
        push(&queues, 1, b"b c");
        push(&queues, 2, b"d e f");

        let stats = run_worker(context(2, &queues, StealPolicy::CrossNode));

        assert_eq!(stats.node, 1);
        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_stolen, 2);
        assert_eq!(stats.tokens, 6);
        assert!(queues.is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("cross-node".parse::<StealPolicy>(), Ok(StealPolicy::CrossNode));
        assert_eq!("LOCAL".parse::<StealPolicy>(), Ok(StealPolicy::LocalOnly));
        assert!("random".parse::<StealPolicy>().is_err());
        assert_eq!(StealPolicy::CrossNode.to_string(), "cross-node");
    }
}
