//! File ingestion pipeline: crawl, per-node loading, and tokenization.

pub mod crawl;
pub mod engine;
pub mod loader;
pub mod metrics;
pub mod partition;
pub mod queue;
pub mod worker;

pub use crawl::{crawl, total_size, FileEntry};
pub use engine::ProcessingEngine;
pub use loader::LoaderStats;
pub use metrics::{IngestReport, ThreadStats};
pub use queue::{LoadedBuffer, NodeQueues};
pub use worker::StealPolicy;
