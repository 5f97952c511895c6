// Turn a raw Engine API stats response into a normalized StatsSample.

use crate::models::{StatsSample, percent_of};
use bollard::models::ContainerStatsResponse;

const MIB: f64 = 1024.0 * 1024.0;
const KIB: f64 = 1024.0;

/// Returns None when the response carries no CPU counters (container not running).
pub(crate) fn sample_from_response(
    s: &ContainerStatsResponse,
    id: &str,
    name: &str,
) -> Option<StatsSample> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let mem_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0) as f64;
    let mem_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0) as f64;

    let (rx, tx) = s.networks.as_ref().map_or((0u64, 0u64), |n| {
        n.values().fold((0, 0), |(rx, tx), v| {
            (rx + v.rx_bytes.unwrap_or(0), tx + v.tx_bytes.unwrap_or(0))
        })
    });

    Some(StatsSample {
        id: id.to_string(),
        name: name.trim_start_matches('/').to_string(),
        cpu_percent: cpu_percent.max(0.0),
        memory_usage_mb: mem_usage / MIB,
        memory_limit_mb: mem_limit / MIB,
        memory_percent: percent_of(mem_usage, mem_limit),
        network_rx_kb: rx as f64 / KIB,
        network_tx_kb: tx as f64 / KIB,
    })
}
