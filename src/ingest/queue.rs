//! Per-node buffer queues.
//!
//! A [`LoadedBuffer`] moves by value: loader → queue → worker. The worker that
//! pops it is the only owner and frees it by dropping it.

use crate::error::IngestError;
use crate::tokenize::{Tokenizer, Tokens};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File content read fully into memory
#[derive(Debug)]
pub struct LoadedBuffer {
    path: PathBuf,
    content: Box<[u8]>,
    /// Set once a mutating tokenizer has rewritten `content`
    rewritten: bool,
}

impl LoadedBuffer {
    pub fn new(path: impl Into<PathBuf>, content: Box<[u8]>) -> Self {
        Self {
            path: path.into(),
            content,
            rewritten: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn is_rewritten(&self) -> bool {
        self.rewritten
    }

    /// Run `tokenizer` over the buffer.
    ///
    /// Once a mutating strategy has run, delimiter bytes are gone and any
    /// further pass is refused with [`IngestError::AlreadyTokenized`].
    pub fn tokenize_with(&mut self, tokenizer: &dyn Tokenizer) -> Result<Tokens, IngestError> {
        if self.rewritten {
            return Err(IngestError::AlreadyTokenized {
                path: self.path.clone(),
            });
        }
        let tokens = tokenizer.tokenize(&mut self.content);
        self.rewritten = tokenizer.mutates_input();
        Ok(tokens)
    }
}

/// One FIFO per NUMA node, each behind its own lock
#[derive(Debug)]
pub struct NodeQueues {
    queues: Vec<Mutex<VecDeque<LoadedBuffer>>>,
}

impl NodeQueues {
    pub fn new(node_count: usize) -> Self {
        Self {
            queues: (0..node_count.max(1))
                .map(|_| Mutex::new(VecDeque::new()))
                .collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.queues.len()
    }

    fn lock(&self, node: usize) -> MutexGuard<'_, VecDeque<LoadedBuffer>> {
        // A panicking holder leaves the deque itself intact
        self.queues[node]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, node: usize, buffer: LoadedBuffer) {
        self.lock(node).push_back(buffer);
    }

    pub fn pop(&self, node: usize) -> Option<LoadedBuffer> {
        self.lock(node).pop_front()
    }

    /// Pop from the first non-empty queue after `node`, wrapping around.
    /// Returns the node the buffer came from.
    pub fn steal(&self, node: usize) -> Option<(usize, LoadedBuffer)> {
        let n = self.queues.len();
        (1..n)
            .map(|offset| (node + offset) % n)
            .find_map(|victim| self.pop(victim).map(|buf| (victim, buf)))
    }

    pub fn len(&self, node: usize) -> usize {
        self.lock(node).len()
    }

    pub fn total_len(&self) -> usize {
        (0..self.queues.len()).map(|node| self.len(node)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}
