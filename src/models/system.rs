// Host and Docker usage models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub usage: f64,
    pub count: u32,
}

/// Byte totals with a used percentage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBlock {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl UsageBlock {
    pub fn new(total: u64, used: u64) -> Self {
        let used = used.min(total);
        Self {
            total,
            used,
            free: total - used,
            percent: percent_of(used as f64, total as f64),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerDiskBlock {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

/// GET /api/stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu: CpuUsage,
    pub memory: UsageBlock,
    pub storage: UsageBlock,
    pub docker: DockerDiskBlock,
}

/// Host CPU/memory/disk sample without the Docker block (filled in by the route).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostUsage {
    pub cpu: CpuUsage,
    pub memory: UsageBlock,
    pub storage: UsageBlock,
}

/// GET /api/system/specs. Memory in MB, disk in GB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSpecs {
    pub cpu_cores: u32,
    pub cpu_model: String,
    pub total_memory: u64,
    pub available_memory: u64,
    pub memory_usage: u32,
    pub disk_total: f64,
    pub disk_used: f64,
    pub disk_free: f64,
    pub operating_system: String,
    pub kernel_version: String,
    pub architecture: String,
}

/// GET /api/docker/resources. Sums over all running containers at sample time.
/// `cpu_usage` is a plain sum of per-container percentages and can exceed 100 on multi-core hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerResources {
    pub cpu_usage: f64,
    /// MB
    pub memory_usage: u64,
    pub memory_percentage: u32,
    /// GB
    pub disk_usage: f64,
    /// KB
    pub network_rx: u64,
    /// KB
    pub network_tx: u64,
}

pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole) * 100.0
    } else {
        0.0
    }
}
