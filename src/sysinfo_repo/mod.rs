// Host CPU, memory and disk sampling via sysinfo

mod linux;

use crate::docker_repo::parse::round_to;
use crate::models::{CpuUsage, HostUsage, SystemSpecs, UsageBlock, percent_of};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, System};
use tracing::instrument;

const MIB: u64 = 1024 * 1024;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// (mount point, total bytes, available bytes) of one mounted filesystem.
type DiskSpace = (String, u64, u64);

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
        }
    }

    /// Point-in-time CPU, memory and root filesystem usage.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_host_usage"))]
    pub async fn get_host_usage(&self) -> anyhow::Result<HostUsage> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;

            let now = Instant::now();
            let usage = match last_cpu_refresh.lock() {
                Ok(mut guard) => match *guard {
                    // Too soon for a meaningful delta; reuse the last reading.
                    Some((prev_ts, prev_usage))
                        if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                    {
                        prev_usage
                    }
                    _ => {
                        sys.refresh_cpu_all();
                        let u = sys.global_cpu_usage() as f64;
                        *guard = Some((now, u));
                        u
                    }
                },
                Err(_) => {
                    sys.refresh_cpu_all();
                    sys.global_cpu_usage() as f64
                }
            };
            sys.refresh_memory();
            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());

            let (disk_total, disk_avail) = root_disk(&disks)?;

            Ok(HostUsage {
                cpu: CpuUsage {
                    usage: round_to(usage.clamp(0.0, 100.0), 1),
                    count: sys.cpus().len() as u32,
                },
                memory: UsageBlock::new(total, used),
                storage: UsageBlock::new(disk_total, disk_total.saturating_sub(disk_avail)),
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Static identity plus current memory/disk figures. Memory in MB, disk in GB.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_system_specs"))]
    pub async fn get_system_specs(&self) -> anyhow::Result<SystemSpecs> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let cpu_model = linux::read_cpu_model_linux()
                .or_else(|| {
                    sys.cpus()
                        .first()
                        .map(|c| c.brand().trim().to_string())
                        .filter(|s| !s.is_empty())
                })
                .unwrap_or_else(|| "Unknown".into());
            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);

            let (disk_total, disk_avail) = root_disk(&disks)?;
            let disk_used = disk_total.saturating_sub(disk_avail);

            let operating_system = linux::read_os_pretty_name()
                .or_else(System::long_os_version)
                .unwrap_or_else(|| std::env::consts::OS.into());

            Ok(SystemSpecs {
                cpu_cores: sys.cpus().len() as u32,
                cpu_model,
                total_memory: total / MIB,
                available_memory: available / MIB,
                memory_usage: percent_of(used as f64, total as f64).round() as u32,
                disk_total: round_to(disk_total as f64 / GIB, 2),
                disk_used: round_to(disk_used as f64 / GIB, 2),
                disk_free: round_to(disk_avail as f64 / GIB, 2),
                operating_system,
                kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".into()),
                architecture: std::env::consts::ARCH.to_string(),
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Host memory in MB, used as the denominator for Docker memory percentage.
    pub async fn total_memory_mb(&self) -> anyhow::Result<u64> {
        Ok(self.get_host_usage().await?.memory.total / MIB)
    }
}

fn root_disk(disks: &Mutex<Disks>) -> anyhow::Result<(u64, u64)> {
    let mut disks = disks
        .lock()
        .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
    disks.refresh(true);
    let spaces: Vec<DiskSpace> = disks
        .list()
        .iter()
        .map(|d| {
            (
                d.mount_point().to_string_lossy().into_owned(),
                d.total_space(),
                d.available_space(),
            )
        })
        .collect();
    Ok(pick_root(&spaces))
}

/// The filesystem mounted at "/", else the largest one, else zeros.
fn pick_root(spaces: &[DiskSpace]) -> (u64, u64) {
    spaces
        .iter()
        .find(|(mount, _, _)| mount == "/")
        .or_else(|| spaces.iter().max_by_key(|(_, total, _)| *total))
        .map_or((0, 0), |(_, total, avail)| (*total, *avail))
}
