//! The two-phase ingestion engine.
//!
//! ```text
//! crawl ─► partition by node ─► phase 1: loaders ─► join ─► phase 2: tokenizers ─► join ─► report
//! ```
//!
//! Phase 1 must complete before phase 2 starts, so the tokenize time measures
//! CPU work over buffers that are already resident.

use super::crawl::{crawl, total_size, FileEntry};
use super::loader::{spawn_loader, LoaderContext, LoaderStats};
use super::metrics::{throughput_mib_s, GlobalCounters, IngestReport, ThreadStats};
use super::partition::partition_by_node;
use super::queue::NodeQueues;
use super::worker::{assign_node, spawn_worker, WorkerContext};
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::numa::{SysfsTopology, Topology};
use crate::output;
use crate::tokenize::{ClassificationTable, Tokenizer};
use crate::utils::progress::{crawl_spinner, loader_bar};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub struct ProcessingEngine {
    config: EngineConfig,
    topology: Arc<dyn Topology>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl ProcessingEngine {
    /// Engine over the machine's detected NUMA layout
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_topology(config, Arc::new(SysfsTopology::detect()))
    }

    pub fn with_topology(
        config: EngineConfig,
        topology: Arc<dyn Topology>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Arc::new(ClassificationTable::alphanumeric());
        let tokenizer = config.tokenizer.build(table);
        Ok(Self {
            config,
            topology,
            tokenizer,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &dyn Topology {
        self.topology.as_ref()
    }

    /// Ingest everything under `root` and print the report to stdout
    pub fn index_files(&self, root: &Path) -> IngestReport {
        let report = self.run(root);
        if let Err(e) = output::print_report(&report) {
            error!("Failed to print report: {}", e);
        }
        report
    }

    /// Placeholder for query evaluation; does nothing
    pub fn search_files(&self) {}

    /// Run both phases and return the aggregated report
    pub fn run(&self, root: &Path) -> IngestReport {
        let files = if self.config.show_progress {
            let spinner = crawl_spinner();
            let files = crawl(root);
            spinner.finish_and_clear();
            files
        } else {
            crawl(root)
        };
        self.run_files(root, files)
    }

    /// Run both phases over an already crawled file list
    pub fn run_files(&self, root: &Path, files: Vec<FileEntry>) -> IngestReport {
        let node_count = self.topology.node_count().max(1);
        let files_crawled = files.len() as u64;
        let dataset_bytes = total_size(&files);
        info!(
            root = %root.display(),
            files = files_crawled,
            bytes = dataset_bytes,
            nodes = node_count,
            "crawl finished"
        );

        let queues = Arc::new(NodeQueues::new(node_count));

        let load_start = Instant::now();
        let loaders = self.load_phase(partition_by_node(files, node_count), &queues);
        let load_time = load_start.elapsed();

        let files_loaded = queues.total_len() as u64;
        let files_skipped = loaders.iter().map(|l| l.skipped).sum();
        let files_failed = loaders.iter().map(|l| l.failed).sum();

        let counters = Arc::new(GlobalCounters::default());
        let tokenize_start = Instant::now();
        let threads = self.tokenize_phase(&queues, &counters);
        let tokenize_time = tokenize_start.elapsed();

        let files_unprocessed = queues.total_len() as u64;
        if files_unprocessed > 0 {
            warn!(
                files = files_unprocessed,
                "buffers left on nodes without a tokenizer thread"
            );
        }

        let total_bytes = counters.total_bytes();
        IngestReport {
            root: root.to_path_buf(),
            strategy: self.config.tokenizer,
            steal_policy: self.config.steal_policy,
            node_count,
            num_threads: self.config.num_threads,
            files_crawled,
            dataset_bytes,
            files_loaded,
            files_skipped,
            files_failed,
            files_unprocessed,
            loaders,
            threads,
            total_bytes,
            total_tokens: counters.total_tokens(),
            load_time,
            tokenize_time,
            throughput_mib_s: throughput_mib_s(total_bytes, tokenize_time),
        }
    }

    /// Phase 1: one pinned loader per node, all joined before returning
    fn load_phase(
        &self,
        partitions: Vec<Vec<FileEntry>>,
        queues: &Arc<NodeQueues>,
    ) -> Vec<LoaderStats> {
        let progress = self.config.show_progress.then(|| {
            loader_bar(partitions.iter().map(|p| p.len() as u64).sum())
        });

        let mut handles = Vec::with_capacity(partitions.len());
        let mut stats = Vec::with_capacity(partitions.len());

        for (node, files) in partitions.into_iter().enumerate() {
            let assigned = files.len() as u64;
            let ctx = LoaderContext {
                node,
                files,
                queues: Arc::clone(queues),
                topology: Arc::clone(&self.topology),
                drop_page_cache: self.config.drop_page_cache,
                progress: progress.clone(),
            };
            match spawn_loader(ctx) {
                Ok(handle) => handles.push((node, assigned, handle)),
                Err(e) => {
                    error!("{}", e);
                    stats.push(LoaderStats {
                        node,
                        failed: assigned,
                        ..Default::default()
                    });
                }
            }
        }

        for (node, assigned, handle) in handles {
            match handle.join() {
                Ok(s) => stats.push(s),
                Err(_) => {
                    error!(loader = node, "loader thread panicked");
                    stats.push(LoaderStats {
                        node,
                        failed: assigned,
                        ..Default::default()
                    });
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        stats.sort_by_key(|s| s.node);
        stats
    }

    /// Phase 2: `num_threads` workers, all joined before returning
    fn tokenize_phase(
        &self,
        queues: &Arc<NodeQueues>,
        counters: &Arc<GlobalCounters>,
    ) -> Vec<ThreadStats> {
        let node_count = queues.node_count();
        let mut handles = Vec::with_capacity(self.config.num_threads);
        let mut stats = Vec::with_capacity(self.config.num_threads);

        for thread_id in 1..=self.config.num_threads {
            let ctx = WorkerContext {
                thread_id,
                queues: Arc::clone(queues),
                counters: Arc::clone(counters),
                tokenizer: Arc::clone(&self.tokenizer),
                topology: Arc::clone(&self.topology),
                affinity: self.config.affinity,
                steal: self.config.steal_policy,
            };
            match spawn_worker(ctx) {
                Ok(handle) => handles.push((thread_id, handle)),
                Err(e) => {
                    error!("{}", e);
                    stats.push(ThreadStats::new(thread_id, assign_node(thread_id, node_count)));
                }
            }
        }

        for (thread_id, handle) in handles {
            match handle.join() {
                Ok(s) => stats.push(s),
                Err(_) => {
                    error!(thread = thread_id, "tokenizer thread panicked");
                    stats.push(ThreadStats::new(thread_id, assign_node(thread_id, node_count)));
                }
            }
        }

        stats.sort_by_key(|s| s.thread_id);
        stats
    }
}

impl std::fmt::Debug for ProcessingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingEngine")
            .field("config", &self.config)
            .field("nodes", &self.topology.node_count())
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}
