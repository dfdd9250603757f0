use super::{CpuSet, Topology};
use crate::error::TopologyError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed node layout whose pinning only counts calls.
///
/// Lets the pipeline run its multi-node paths on any machine.
#[derive(Debug)]
pub struct StaticTopology {
    nodes: Vec<CpuSet>,
    pins: AtomicUsize,
}

impl StaticTopology {
    /// One entry per node. An empty list is treated as a single CPU-less node.
    pub fn new(nodes: Vec<CpuSet>) -> Self {
        let nodes = if nodes.is_empty() {
            vec![CpuSet::default()]
        } else {
            nodes
        };
        Self {
            nodes,
            pins: AtomicUsize::new(0),
        }
    }

    /// `node_count` nodes splitting `cpu_count` CPUs into contiguous blocks
    pub fn uniform(node_count: usize, cpu_count: usize) -> Self {
        let node_count = node_count.max(1);
        let per_node = (cpu_count / node_count).max(1);
        let nodes = (0..node_count)
            .map(|n| CpuSet::new(n * per_node..(n + 1) * per_node))
            .collect();
        Self::new(nodes)
    }

    /// Number of successful pin calls so far
    pub fn pin_count(&self) -> usize {
        self.pins.load(Ordering::Relaxed)
    }
}

impl Topology for StaticTopology {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn cpus_for_node(&self, node: usize) -> Result<CpuSet, TopologyError> {
        let cpus = self.nodes.get(node).ok_or(TopologyError::UnknownNode {
            node,
            node_count: self.nodes.len(),
        })?;
        if cpus.is_empty() {
            return Err(TopologyError::EmptyCpuSet(node));
        }
        Ok(cpus.clone())
    }

    fn pin_current_thread(&self, cpus: &CpuSet) -> Result<(), TopologyError> {
        if cpus.is_empty() {
            return Err(TopologyError::Affinity(std::io::Error::from(
                std::io::ErrorKind::InvalidInput,
            )));
        }
        self.pins.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
