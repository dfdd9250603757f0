//! NUMA topology and thread affinity.
//!
//! [`Topology`] is the seam between the pipeline and the machine:
//!
//! - [`SysfsTopology`] reads `/sys/devices/system/node` and pins threads with
//!   `sched_setaffinity` (Linux)
//! - [`StaticTopology`] is a caller-defined layout whose pinning is a no-op,
//!   used to simulate multi-node machines
//!
//! Every failure here is advisory. Callers log it and keep running unpinned.

pub mod fixed;
pub mod sysfs;

pub use fixed::StaticTopology;
pub use sysfs::SysfsTopology;

use crate::error::TopologyError;
use std::fmt;
use tracing::{debug, warn};

/// Sorted, de-duplicated set of CPU ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuSet(Vec<usize>);

impl CpuSet {
    pub fn new(cpus: impl IntoIterator<Item = usize>) -> Self {
        let mut cpus: Vec<usize> = cpus.into_iter().collect();
        cpus.sort_unstable();
        cpus.dedup();
        Self(cpus)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, cpu: usize) -> bool {
        self.0.binary_search(&cpu).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for CpuSet {
    /// Linux cpulist notation, e.g. `0-3,8,10-11`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut iter = self.0.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

/// NUMA layout of the machine and the ability to bind the calling thread to it
pub trait Topology: Send + Sync {
    /// Number of NUMA nodes, always at least 1
    fn node_count(&self) -> usize;

    fn cpus_for_node(&self, node: usize) -> Result<CpuSet, TopologyError>;

    /// Restrict the calling thread to `cpus`
    fn pin_current_thread(&self, cpus: &CpuSet) -> Result<(), TopologyError>;

    /// CPU the calling thread is running on right now, if known
    fn current_cpu(&self) -> Option<usize> {
        None
    }

    fn node_of_cpu(&self, cpu: usize) -> Option<usize> {
        (0..self.node_count()).find(|&node| {
            self.cpus_for_node(node)
                .map(|cpus| cpus.contains(cpu))
                .unwrap_or(false)
        })
    }
}

/// Pin the calling thread to `node`, logging the outcome.
///
/// Returns whether pinning succeeded; failure never stops the caller.
pub fn pin_to_node(topology: &dyn Topology, role: &str, thread_id: usize, node: usize) -> bool {
    let result = topology
        .cpus_for_node(node)
        .and_then(|cpus| topology.pin_current_thread(&cpus).map(|()| cpus));

    match result {
        Ok(cpus) => {
            debug!(role, thread = thread_id, node, cpus = %cpus, "affinity set");
            if let Some(cpu) = topology.current_cpu() {
                debug!(
                    role,
                    thread = thread_id,
                    cpu,
                    running_node = ?topology.node_of_cpu(cpu),
                    "thread placement"
                );
            }
            true
        }
        Err(e) => {
            warn!(role, thread = thread_id, node, error = %e, "running unpinned");
            false
        }
    }
}

/// Parse Linux cpulist format (e.g., "0-3,8,10-15")
pub fn parse_cpulist(cpulist: &str) -> CpuSet {
    let mut cpus = Vec::new();

    for part in cpulist.trim().split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                cpus.extend(start..=end);
            }
        } else if let Ok(cpu) = part.parse::<usize>() {
            cpus.push(cpu);
        }
    }

    CpuSet::new(cpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpulist_parsing() {
        assert_eq!(parse_cpulist("0"), CpuSet::new([0]));
        assert_eq!(parse_cpulist("0-3"), CpuSet::new([0, 1, 2, 3]));
        assert_eq!(parse_cpulist("0,2,4\n"), CpuSet::new([0, 2, 4]));
        assert_eq!(
            parse_cpulist("0-3,8,10-12"),
            CpuSet::new([0, 1, 2, 3, 8, 10, 11, 12])
        );
        assert!(parse_cpulist("").is_empty());
        assert!(parse_cpulist("garbage").is_empty());
    }

    #[test]
    fn test_cpuset_display() {
        assert_eq!(CpuSet::new([3, 0, 1, 2, 8, 10, 11]).to_string(), "0-3,8,10-11");
        assert_eq!(CpuSet::new([5]).to_string(), "5");
        assert_eq!(CpuSet::default().to_string(), "");
    }

    #[test]
    fn test_pin_to_node_reports_failure() {
        let topology = StaticTopology::new(vec![CpuSet::new([0, 1])]);
        assert!(pin_to_node(&topology, "worker", 1, 0));
        assert!(!pin_to_node(&topology, "worker", 1, 5));
        assert_eq!(topology.pin_count(), 1);
    }

    #[test]
    fn test_node_of_cpu_default() {
        let topology = StaticTopology::new(vec![CpuSet::new([0, 1]), CpuSet::new([2, 3])]);
        assert_eq!(topology.node_of_cpu(3), Some(1));
        assert_eq!(topology.node_of_cpu(9), None);
    }
}
