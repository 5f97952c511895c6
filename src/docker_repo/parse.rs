// Parsers for the runtime CLI's line-oriented output: inventory records, stats samples, sizes.
// Parsing is greedy: missing fields default to empty/zero and a bad line never fails the listing.

use crate::models::{Container, ContainerState, Image, StatsSample};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// `ps` format: one pipe-delimited record per container.
pub const CONTAINER_FORMAT: &str = "{{.ID}}|{{.Names}}|{{.Image}}|{{.Status}}|{{.Ports}}|{{.CreatedAt}}";
/// `images` format: one pipe-delimited record per repository:tag.
pub const IMAGE_FORMAT: &str = "{{.ID}}|{{.Repository}}|{{.Tag}}|{{.Size}}|{{.CreatedAt}}";
/// `stats` format: one JSON object per container.
pub const STATS_FORMAT: &str = "{{json .}}";
/// `system df` format: one row per space category (images, containers, volumes, build cache).
pub const DISK_USAGE_FORMAT: &str = "{{.Type}}|{{.Size}}";

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

fn non_blank_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|l| !l.is_empty())
}

pub fn parse_containers(stdout: &str) -> Vec<Container> {
    non_blank_lines(stdout).map(parse_container_line).collect()
}

pub fn parse_container_line(line: &str) -> Container {
    let mut fields = line.split('|').map(str::trim);
    let mut next = || fields.next().unwrap_or_default().to_string();
    let id = next();
    let name = next();
    let image = next();
    let status = next();
    let ports = next();
    let created = next();
    Container {
        id,
        name,
        image,
        state: ContainerState::from_status(&status),
        status,
        ports: ports
            .split(", ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
        created,
        stats: None,
    }
}

/// Parse image rows, merging rows that share an id (one image, several tags).
pub fn parse_images(stdout: &str) -> Vec<Image> {
    let mut images: Vec<Image> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in non_blank_lines(stdout) {
        let image = parse_image_line(line);
        match index.get(&image.id) {
            Some(&i) => {
                for tag in image.repo_tags {
                    if !images[i].repo_tags.contains(&tag) {
                        images[i].repo_tags.push(tag);
                    }
                }
            }
            None => {
                index.insert(image.id.clone(), images.len());
                images.push(image);
            }
        }
    }
    images
}

pub fn parse_image_line(line: &str) -> Image {
    let mut fields = line.split('|').map(str::trim);
    let mut next = || fields.next().unwrap_or_default().to_string();
    let id = next();
    let name = next();
    let tag = next();
    let size = next();
    let created = next();
    let repo_tags = if name.is_empty() || name == "<none>" {
        Vec::new()
    } else {
        vec![format!("{}:{}", name, tag)]
    };
    Image {
        id,
        name,
        tag,
        repo_tags,
        size_bytes: parse_size_bytes(&size).map_or(0, |b| b as u64),
        size,
        created,
    }
}

/// Raw `stats --format '{{json .}}'` row.
#[derive(Debug, Default, Deserialize)]
struct CliStatsLine {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "CPUPerc", default)]
    cpu_perc: String,
    #[serde(rename = "MemUsage", default)]
    mem_usage: String,
    #[serde(rename = "MemPerc", default)]
    mem_perc: String,
    #[serde(rename = "NetIO", default)]
    net_io: String,
}

pub fn parse_stats(stdout: &str) -> Vec<StatsSample> {
    non_blank_lines(stdout)
        .filter_map(|line| match serde_json::from_str::<CliStatsLine>(line) {
            Ok(raw) => Some(stats_sample(raw)),
            Err(e) => {
                warn!(error = %e, line = %line, "skipping unparseable stats line");
                None
            }
        })
        .collect()
}

fn stats_sample(raw: CliStatsLine) -> StatsSample {
    let (memory_usage_mb, memory_limit_mb) = parse_memory_usage(&raw.mem_usage);
    let (network_rx_kb, network_tx_kb) = parse_net_io(&raw.net_io);
    StatsSample {
        id: raw.id,
        name: raw.name,
        cpu_percent: parse_percent(&raw.cpu_perc),
        memory_usage_mb,
        memory_limit_mb,
        memory_percent: parse_percent(&raw.mem_perc),
        network_rx_kb,
        network_tx_kb,
    }
}

/// "12.5%" -> 12.5; anything unparseable -> 0.
pub fn parse_percent(s: &str) -> f64 {
    s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0)
}

/// Size string to bytes: "512MiB", "1.2GB", "3kB", "0B". Every prefix is a power of 1024,
/// whether or not the runtime printed the `i`.
pub fn parse_size_bytes(s: &str) -> Option<f64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let value: f64 = num.parse().ok()?;
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" | "kib" => KB,
        "m" | "mb" | "mib" => MB,
        "g" | "gb" | "gib" => MB * KB,
        "t" | "tb" | "tib" => MB * MB,
        "p" | "pb" | "pib" => MB * MB * KB,
        _ => return None,
    };
    Some(value * factor)
}

pub fn size_to_mb(s: &str) -> f64 {
    parse_size_bytes(s).map_or(0.0, |b| b / MB)
}

pub fn size_to_kb(s: &str) -> f64 {
    parse_size_bytes(s).map_or(0.0, |b| b / KB)
}

/// "512MiB / 2GiB" -> (512.0, 2048.0) in MB.
pub fn parse_memory_usage(s: &str) -> (f64, f64) {
    let (used, limit) = s.split_once('/').unwrap_or((s, ""));
    (size_to_mb(used), size_to_mb(limit))
}

/// "1.2MB / 3kB" -> (rx, tx) in KB.
pub fn parse_net_io(s: &str) -> (f64, f64) {
    let (rx, tx) = s.split_once('/').unwrap_or((s, ""));
    (size_to_kb(rx), size_to_kb(tx))
}

/// Sum every space row of `system df` in bytes.
pub fn parse_disk_usage(stdout: &str) -> u64 {
    non_blank_lines(stdout)
        .map(|line| {
            let size = line.rsplit_once('|').map_or(line, |(_, size)| size);
            parse_size_bytes(size).unwrap_or_else(|| {
                warn!(line = %line, "skipping unparseable disk usage row");
                0.0
            })
        })
        .sum::<f64>() as u64
}

/// Bytes to a short human-readable string using the same 1024 steps `parse_size_bytes` reads.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= KB && unit < UNITS.len() - 1 {
        value /= KB;
        unit += 1;
    }
    let s = format!("{:.1}", value);
    let s = s.strip_suffix(".0").unwrap_or(&s);
    format!("{}{}", s, UNITS[unit])
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (value * f).round() / f
}
