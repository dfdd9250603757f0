use super::crawl::FileEntry;
use rayon::prelude::*;

/// Split files across `node_count` nodes.
///
/// Files are sorted largest first, then dealt out round-robin, so node 0 gets
/// the 1st, (n+1)th, ... largest files. Every input file lands in exactly one
/// partition. This is a balancing heuristic, not an optimal packing.
pub fn partition_by_node(mut files: Vec<FileEntry>, node_count: usize) -> Vec<Vec<FileEntry>> {
    let node_count = node_count.max(1);

    // Stable, so equal-size files keep crawl order
    files.par_sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

    let mut partitions: Vec<Vec<FileEntry>> = (0..node_count)
        .map(|_| Vec::with_capacity(files.len() / node_count + 1))
        .collect();

    for (i, file) in files.into_iter().enumerate() {
        partitions[i % node_count].push(file);
    }

    partitions
}
