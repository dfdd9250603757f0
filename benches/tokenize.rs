//! Performance benchmarks for the tokenizer strategies and the full pipeline
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use nidx::config::EngineConfig;
use nidx::ingest::ProcessingEngine;
use nidx::numa::StaticTopology;
use nidx::tokenize::{ClassificationTable, TokenizerKind};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn sample_text() -> Vec<u8> {
    let paragraph = b"The 2 quick brown foxes jumped over 13 lazy dogs; \
        meanwhile, id=4096 and user_name=\"alice\" were logged.\n";
    paragraph.repeat(512)
}

/// Create a directory tree with files of varying sizes
fn create_benchmark_fixtures() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::Builder::new()
        .prefix("nidx-bench")
        .tempdir()
        .expect("Failed to create temp dir");
    let root_path = temp_dir.path().to_path_buf();

    let text = sample_text();
    for i in 0..64 {
        let dir = root_path.join(format!("dir_{}", i % 8));
        fs::create_dir_all(&dir).expect("Failed to create dir");
        let len = text.len() / (1 + i % 4);
        fs::write(dir.join(format!("file_{}.txt", i)), &text[..len])
            .expect("Failed to write file");
    }

    (temp_dir, root_path)
}

fn bench_strategies(c: &mut Criterion) {
    let table = Arc::new(ClassificationTable::alphanumeric());
    let text = sample_text();

    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for kind in TokenizerKind::ALL {
        let tokenizer = kind.build(Arc::clone(&table));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &text, |b, text| {
            b.iter_batched(
                || text.clone(),
                |mut buf| tokenizer.tokenize(black_box(&mut buf)).len(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_fixtures();

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for (threads, nodes) in [(1, 1), (4, 1), (4, 2)] {
        let config = EngineConfig::new(threads, 1)
            .expect("valid config")
            .with_drop_page_cache(false);
        let engine = ProcessingEngine::with_topology(
            config,
            Arc::new(StaticTopology::uniform(nodes, 8)),
        )
        .expect("valid engine");

        group.bench_function(format!("{}t_{}n", threads, nodes), |b| {
            b.iter(|| engine.run(black_box(&root_path)).total_tokens)
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_pipeline);
criterion_main!(benches);
