//! # nidx - NUMA-aware file ingestion
//!
//! nidx crawls a directory tree, loads every file into memory on the NUMA
//! node that will process it, and tokenizes the loaded buffers with a pool of
//! node-affinitized threads. The result is a throughput report; nothing is
//! persisted.
//!
//! ## Architecture
//!
//! - [`ingest`] - Crawl, per-node loaders and queues, tokenizer workers, metrics
//! - [`tokenize`] - Byte classification table and the tokenizer strategies
//! - [`numa`] - NUMA topology detection and thread pinning
//! - [`config`] - Validated engine configuration
//! - [`output`] - Report formatting (text and JSON)
//! - [`utils`] - Persisted defaults and progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use nidx::config::EngineConfig;
//! use nidx::ingest::ProcessingEngine;
//! use std::path::Path;
//!
//! let config = EngineConfig::new(4, 1).unwrap();
//! let engine = ProcessingEngine::new(config).unwrap();
//! let report = engine.run(Path::new("/data/corpus"));
//!
//! println!("{} bytes, {} tokens", report.total_bytes, report.total_tokens);
//! ```
//!
//! ## Pipeline
//!
//! Ingestion runs in two phases separated by a barrier:
//!
//! 1. **Load** - files are partitioned across nodes and read by one pinned
//!    loader thread per node into that node's queue
//! 2. **Tokenize** - worker `i` drains the queue of node `(i - 1) % nodes`,
//!    classifying bytes through a 256-entry table

pub mod config;
pub mod error;
pub mod ingest;
pub mod numa;
pub mod output;
pub mod tokenize;
pub mod utils;

pub use config::EngineConfig;
pub use error::{IngestError, Result};
pub use ingest::{IngestReport, ProcessingEngine};
