//! Phase 1: node-pinned loader threads.
//!
//! One loader per NUMA node reads its partition into owned buffers and feeds
//! that node's queue. The queue lock is only taken for the push itself.

use super::crawl::FileEntry;
use super::queue::{LoadedBuffer, NodeQueues};
use crate::error::{IngestError, LoadError};
use crate::numa::{pin_to_node, Topology};
use crate::utils::progress::ProgressBar;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Outcome counters for one loader thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    pub node: usize,
    pub loaded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes: u64,
}

/// Everything a loader thread owns or shares
pub struct LoaderContext {
    pub node: usize,
    pub files: Vec<FileEntry>,
    pub queues: Arc<NodeQueues>,
    pub topology: Arc<dyn Topology>,
    pub drop_page_cache: bool,
    pub progress: Option<ProgressBar>,
}

/// Spawn the loader thread for `ctx.node`
pub fn spawn_loader(ctx: LoaderContext) -> Result<JoinHandle<LoaderStats>, IngestError> {
    let node = ctx.node;
    thread::Builder::new()
        .name(format!("loader-{}", node))
        .spawn(move || run_loader(ctx))
        .map_err(|e| IngestError::Spawn {
            role: "loader",
            id: node,
            reason: e.to_string(),
        })
}

/// Loader body; runs on the calling thread
pub fn run_loader(ctx: LoaderContext) -> LoaderStats {
    let LoaderContext {
        node,
        files,
        queues,
        topology,
        drop_page_cache,
        progress,
    } = ctx;

    // Loaders always try to pin, independent of the worker affinity flag
    pin_to_node(topology.as_ref(), "loader", node, node);

    let mut stats = LoaderStats {
        node,
        ..Default::default()
    };

    for entry in &files {
        if let Some(ref pb) = progress {
            pb.inc(1);
        }

        if entry.path.as_os_str().is_empty() || is_hidden_path(&entry.path) {
            stats.skipped += 1;
            continue;
        }

        match load_file(entry, drop_page_cache) {
            Ok(buffer) => {
                stats.loaded += 1;
                stats.bytes += buffer.size_bytes();
                queues.push(node, buffer);
            }
            Err(e) => {
                stats.failed += 1;
                error!(loader = node, "{}", e);
            }
        }
    }

    info!(
        loader = node,
        loaded = stats.loaded,
        skipped = stats.skipped,
        failed = stats.failed,
        "loader completed"
    );
    stats
}

/// True when any normal path component starts with `.`
pub fn is_hidden_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.as_encoded_bytes().first() == Some(&b'.'),
        _ => false,
    })
}

/// Read a whole file into a buffer sized from the crawl.
///
/// A file that yields fewer bytes than reported is a short read and is
/// discarded.
pub fn load_file(entry: &FileEntry, drop_page_cache: bool) -> Result<LoadedBuffer, LoadError> {
    let mut file = File::open(&entry.path).map_err(|source| LoadError::Open {
        path: entry.path.clone(),
        source,
    })?;

    let len = usize::try_from(entry.size_bytes).map_err(|_| LoadError::Read {
        path: entry.path.clone(),
        source: io::Error::other("file does not fit in memory"),
    })?;

    let mut content = vec![0u8; len];
    let read = read_full(&mut file, &mut content).map_err(|source| LoadError::Read {
        path: entry.path.clone(),
        source,
    })?;

    if read != len {
        return Err(LoadError::ShortRead {
            path: entry.path.clone(),
            expected: entry.size_bytes,
            actual: read as u64,
        });
    }

    if drop_page_cache {
        advise_dont_need(&file, &entry.path);
    }

    Ok(LoadedBuffer::new(entry.path.clone(), content.into_boxed_slice()))
}

/// Fill `buf` until it is full or the file ends
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Drop the file's pages from the page cache so repeated runs measure disk, not RAM
#[cfg(target_os = "linux")]
fn advise_dont_need(file: &File, path: &Path) {
    use std::os::fd::AsRawFd;

    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
    if ret != 0 {
        debug!(path = %path.display(), errno = ret, "posix_fadvise failed");
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_dont_need(_file: &File, _path: &Path) {}
