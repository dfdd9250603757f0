//! End-to-end runs of the ingestion pipeline over temporary directory trees

use nidx::config::EngineConfig;
use nidx::ingest::{crawl, IngestReport, ProcessingEngine, StealPolicy};
use nidx::numa::StaticTopology;
use nidx::tokenize::TokenizerKind;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// tempfile's default `.tmp` prefix would mark the whole tree as hidden
fn tempdir() -> TempDir {
    tempfile::Builder::new().prefix("nidx-it").tempdir().unwrap()
}

fn run(root: &Path, threads: usize, nodes: usize, configure: impl FnOnce(EngineConfig) -> EngineConfig) -> IngestReport {
    let config = configure(EngineConfig::new(threads, 1).unwrap());
    let topology = Arc::new(StaticTopology::uniform(nodes, 8));
    ProcessingEngine::with_topology(config, topology)
        .unwrap()
        .run(root)
}

fn write_sized(root: &Path, name: &str, len: usize) {
    fs::write(root.join(name), "ab ".repeat(len / 3 + 1)[..len].as_bytes()).unwrap();
}

fn corpus() -> TempDir {
    let dir = tempdir();
    let root = dir.path();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::write(root.join("README"), "The quick brown fox\njumps over the lazy dog.\n").unwrap();
    fs::write(root.join("src/main.c"), "int main(void) { return 0; }\n").unwrap();
    fs::write(root.join("src/nested/data.csv"), "id,name,score\n1,alice,92\n2,bob,87\n").unwrap();
    fs::write(root.join("src/nested/blank.txt"), "   \n\t\n").unwrap();
    fs::write(root.join("src/utf8.txt"), "café naïve 42\n").unwrap();
    dir
}

#[test]
fn test_total_bytes_independent_of_thread_count() {
    let dir = tempdir();
    write_sized(dir.path(), "a.txt", 100);
    write_sized(dir.path(), "b.txt", 50);
    write_sized(dir.path(), "c.txt", 10);

    for threads in [1, 2, 4] {
        let report = run(dir.path(), threads, 1, |c| c);
        assert_eq!(report.files_loaded, 3, "threads={}", threads);
        assert_eq!(report.total_bytes, 160, "threads={}", threads);
        assert_eq!(report.threads.len(), threads);
        let per_thread: u64 = report.threads.iter().map(|t| t.bytes_processed).sum();
        assert_eq!(per_thread, 160);
    }

    for threads in [2, 4] {
        assert_eq!(run(dir.path(), threads, 2, |c| c).total_bytes, 160);
    }
}

#[test]
fn test_token_count_invariant_across_layouts() {
    let dir = corpus();
    let baseline = run(dir.path(), 1, 1, |c| c).total_tokens;
    // The|quick|brown|fox|jumps|over|the|lazy|dog = 9
    // int|main|void|return|0 = 5
    // id|name|score|1|alice|92|2|bob|87 = 9
    // caf|na|ve|42 = 4 (non-ASCII bytes are delimiters)
    assert_eq!(baseline, 27);

    for (threads, nodes) in [(2, 1), (3, 2), (4, 2), (8, 3)] {
        let report = run(dir.path(), threads, nodes, |c| c);
        assert_eq!(report.total_tokens, baseline, "threads={} nodes={}", threads, nodes);
    }

    let stealing = run(dir.path(), 1, 4, |c| c.with_steal_policy(StealPolicy::CrossNode));
    assert_eq!(stealing.total_tokens, baseline);
    assert_eq!(stealing.files_unprocessed, 0);
}

#[test]
fn test_strategies_agree() {
    let dir = corpus();
    let counts: Vec<u64> = TokenizerKind::ALL
        .iter()
        .map(|&kind| run(dir.path(), 2, 2, |c| c.with_tokenizer(kind)).total_tokens)
        .collect();
    assert!(counts.windows(2).all(|w| w[0] == w[1]), "{:?}", counts);
}

#[test]
fn test_empty_file_is_loaded_with_zero_bytes() {
    let dir = tempdir();
    fs::write(dir.path().join("empty"), b"").unwrap();
    fs::write(dir.path().join("word"), b"word").unwrap();

    let report = run(dir.path(), 1, 1, |c| c);
    assert_eq!(report.files_loaded, 2);
    assert_eq!(report.total_bytes, 4);
    assert_eq!(report.total_tokens, 1);
    assert_eq!(report.threads[0].files_processed, 2);
}

#[test]
fn test_hidden_entries_are_skipped() {
    let dir = tempdir();
    fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
    fs::write(dir.path().join(".git/objects/pack"), b"binary blob").unwrap();
    fs::write(dir.path().join(".env"), b"SECRET=1").unwrap();
    fs::write(dir.path().join("visible.txt"), b"shown").unwrap();

    let report = run(dir.path(), 2, 2, |c| c);
    assert_eq!(report.files_crawled, 3);
    assert_eq!(report.files_skipped, 2);
    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.total_bytes, 5);
}

#[test]
fn test_three_threads_on_two_nodes() {
    let dir = tempdir();
    for i in 0..6 {
        write_sized(dir.path(), &format!("f{}.txt", i), 30 + i);
    }

    let report = run(dir.path(), 3, 2, |c| c);
    let nodes: Vec<usize> = report.threads.iter().map(|t| t.node).collect();
    assert_eq!(nodes, vec![0, 1, 0]);

    let processed: u64 = report.threads.iter().map(|t| t.files_processed).sum();
    assert_eq!(processed, 6);
    assert_eq!(report.threads[1].files_processed, 3);
    assert_eq!(report.loaders.len(), 2);
    assert!(report.loaders.iter().all(|l| l.loaded == 3));
}

#[test]
fn test_unserved_node_keeps_its_buffers() {
    let dir = tempdir();
    for i in 0..4 {
        write_sized(dir.path(), &format!("f{}.txt", i), 9);
    }

    let local = run(dir.path(), 1, 2, |c| c);
    assert_eq!(local.files_loaded, 4);
    assert_eq!(local.files_unprocessed, 2);
    assert_eq!(local.total_bytes, 18);

    let stealing = run(dir.path(), 1, 2, |c| c.with_steal_policy(StealPolicy::CrossNode));
    assert_eq!(stealing.files_unprocessed, 0);
    assert_eq!(stealing.total_bytes, 36);
    assert_eq!(stealing.threads[0].files_stolen, 2);
}

#[test]
fn test_file_removed_after_crawl_counts_as_failed() {
    let dir = corpus();
    let files = crawl(dir.path());
    let doomed = dir.path().join("src/main.c");
    fs::remove_file(&doomed).unwrap();

    let config = EngineConfig::new(3, 0).unwrap();
    let report = ProcessingEngine::with_topology(config, Arc::new(StaticTopology::uniform(2, 8)))
        .unwrap()
        .run_files(dir.path(), files);

    assert_eq!(report.files_crawled, 5);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.files_loaded, 4);
    // 27 tokens in the full corpus, 5 of them in main.c
    assert_eq!(report.total_tokens, 22);
    assert_eq!(report.total_bytes, report.dataset_bytes - 29);
}

#[test]
fn test_missing_root() {
    let dir = tempdir();
    let report = run(&dir.path().join("does-not-exist"), 2, 1, |c| c);
    assert_eq!(report.files_crawled, 0);
    assert_eq!(report.total_tokens, 0);
    assert_eq!(report.throughput_mib_s, 0.0);
}

#[test]
fn test_report_serializes() {
    let dir = corpus();
    let report = run(dir.path(), 2, 2, |c| c.with_tokenizer(TokenizerKind::Delimiter));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["strategy"], "delimiter");
    assert_eq!(json["steal_policy"], "local-only");
    assert_eq!(json["total_tokens"], 27);
    assert_eq!(json["threads"].as_array().unwrap().len(), 2);
}
