// Container inventory models

use serde::{Deserialize, Serialize};

/// Container lifecycle state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Stopped,
    Exited,
    Paused,
    Created,
}

impl ContainerState {
    /// Infer state from the runtime's human-readable status (e.g. "Up 2 hours", "Exited (0) 3 days ago").
    /// First match wins: Up > Exited > Paused > Created, anything else is Stopped.
    pub fn from_status(status: &str) -> Self {
        if status.contains("Up") {
            ContainerState::Running
        } else if status.contains("Exited") {
            ContainerState::Exited
        } else if status.contains("Paused") {
            ContainerState::Paused
        } else if status.contains("Created") {
            ContainerState::Created
        } else {
            ContainerState::Stopped
        }
    }

    pub fn is_running(self) -> bool {
        self == ContainerState::Running
    }
}

/// Resource usage of one running container. Memory values are MB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerResourceStats {
    pub cpu_percent: f64,
    pub memory_usage: f64,
    pub memory_limit: f64,
    pub memory_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_usage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub status: String,
    pub ports: Vec<String>,
    pub created: String,
    /// Only ever set while `state` is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ContainerResourceStats>,
}

impl Container {
    /// Attach stats; ignored unless the container is running.
    pub fn attach_stats(&mut self, stats: ContainerResourceStats) {
        if self.state.is_running() {
            self.stats = Some(stats);
        }
    }
}

/// Totals for GET /api/containers/stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCounts {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
}

impl ContainerCounts {
    pub fn from_inventory(containers: &[Container]) -> Self {
        let running = containers.iter().filter(|c| c.state.is_running()).count();
        Self {
            total: containers.len(),
            running,
            stopped: containers.len() - running,
        }
    }
}

/// One runtime stats sample, already normalized: memory in MB, network in KB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSample {
    pub id: String,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_usage_mb: f64,
    pub memory_limit_mb: f64,
    pub memory_percent: f64,
    pub network_rx_kb: f64,
    pub network_tx_kb: f64,
}

impl From<&StatsSample> for ContainerResourceStats {
    fn from(s: &StatsSample) -> Self {
        Self {
            cpu_percent: s.cpu_percent,
            memory_usage: s.memory_usage_mb,
            memory_limit: s.memory_limit_mb,
            memory_percent: s.memory_percent,
            storage_usage: None,
        }
    }
}
