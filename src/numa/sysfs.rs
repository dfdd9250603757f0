use super::{parse_cpulist, CpuSet, Topology};
use crate::error::TopologyError;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const NODE_DIR: &str = "/sys/devices/system/node";

/// Topology read from sysfs at construction time.
///
/// Falls back to a single node holding every online CPU when the node
/// directory is missing or empty.
#[derive(Debug, Clone)]
pub struct SysfsTopology {
    nodes: Vec<CpuSet>,
}

impl SysfsTopology {
    /// Detect NUMA topology from /sys/devices/system/node
    pub fn detect() -> Self {
        Self::from_node_dir(Path::new(NODE_DIR))
    }

    /// Detect from an alternative sysfs-shaped directory
    pub fn from_node_dir(node_dir: &Path) -> Self {
        match read_nodes(node_dir) {
            Ok(nodes) => {
                debug!(nodes = nodes.len(), "detected NUMA topology");
                Self { nodes }
            }
            Err(e) => {
                warn!(error = %e, "NUMA is not available, assuming a single node");
                Self {
                    nodes: vec![CpuSet::new(0..online_cpus())],
                }
            }
        }
    }
}

/// Read `nodeN/cpulist` entries. Node ids may be sparse; gaps become empty sets.
fn read_nodes(node_dir: &Path) -> Result<Vec<CpuSet>, TopologyError> {
    let entries = fs::read_dir(node_dir).map_err(|_| TopologyError::Unavailable)?;

    let mut found = BTreeMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(id) = name.strip_prefix("node").and_then(|n| n.parse::<usize>().ok()) else {
            continue;
        };
        let cpus = fs::read_to_string(entry.path().join("cpulist"))
            .map(|text| parse_cpulist(&text))
            .unwrap_or_default();
        found.insert(id, cpus);
    }

    let Some(&max_node) = found.keys().next_back() else {
        return Err(TopologyError::Unavailable);
    };

    let mut nodes = vec![CpuSet::default(); max_node + 1];
    for (id, cpus) in found {
        nodes[id] = cpus;
    }
    Ok(nodes)
}

fn online_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Topology for SysfsTopology {
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
        set_affinity(cpus)
    }

    fn current_cpu(&self) -> Option<usize> {
        current_cpu()
    }
}

#[cfg(target_os = "linux")]
fn set_affinity(cpus: &CpuSet) -> Result<(), TopologyError> {
    if cpus.is_empty() {
        return Err(TopologyError::Affinity(std::io::Error::from(
            std::io::ErrorKind::InvalidInput,
        )));
    }
    let max = libc::CPU_SETSIZE as usize;
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        for cpu in cpus.iter().filter(|&cpu| cpu < max) {
            libc::CPU_SET(cpu, &mut set);
        }
        let res = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
        if res != 0 {
            return Err(TopologyError::Affinity(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_affinity(_cpus: &CpuSet) -> Result<(), TopologyError> {
    Err(TopologyError::Unsupported)
}

#[cfg(target_os = "linux")]
fn current_cpu() -> Option<usize> {
    let cpu = unsafe { libc::sched_getcpu() };
    usize::try_from(cpu).ok()
}

#[cfg(not(target_os = "linux"))]
fn current_cpu() -> Option<usize> {
    None
}
