// Docker inventory, resource aggregation and action gateway over a pluggable runtime client.

mod api;
mod cli;
mod command;
pub mod parse;
mod runtime;
mod stats;

pub use api::ApiRuntime;
pub use cli::CliRuntime;
pub use command::{CommandOutput, CommandRunner, find_executable};
pub use runtime::RuntimeClient;

use crate::config::{RuntimeBackend, RuntimeConfig};
use crate::error::RuntimeError;
use crate::models::{
    BatchItemResult, BatchResponse, BuildImageBody, BuildRequest, Container, ContainerCounts,
    ContainerResourceStats, DockerResources, Image, PortMapping, RunContainerBody, RunRequest,
    SENTINEL_IMAGES, VolumeMapping, percent_of,
};
use parse::round_to;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Action applied to each id of a batch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    StartContainer,
    StopContainer,
    DeleteContainer,
    DeleteImage,
}

impl BatchAction {
    fn label(self) -> &'static str {
        match self {
            BatchAction::StartContainer => "start",
            BatchAction::StopContainer => "stop",
            BatchAction::DeleteContainer => "delete container",
            BatchAction::DeleteImage => "delete image",
        }
    }
}

pub struct DockerRepo {
    runtime: Arc<dyn RuntimeClient>,
    default_log_lines: usize,
    max_log_lines: usize,
}

impl DockerRepo {
    pub fn new(runtime: Arc<dyn RuntimeClient>, default_log_lines: usize, max_log_lines: usize) -> Self {
        Self {
            runtime,
            default_log_lines,
            max_log_lines: max_log_lines.max(1),
        }
    }

    /// Build the runtime client named by `config.backend`.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let timeout = Duration::from_secs(config.command_timeout_secs);
        let long_timeout = Duration::from_secs(config.build_timeout_secs);
        let runtime: Arc<dyn RuntimeClient> = match config.backend {
            RuntimeBackend::Cli => {
                let runner = CommandRunner::new(config.binary.clone(), timeout);
                if let Err(e) = runner.resolve() {
                    // Not fatal: requests report it until the binary shows up.
                    warn!(binary = %config.binary, error = %e, "container runtime not found at startup");
                }
                Arc::new(CliRuntime::new(runner, long_timeout))
            }
            RuntimeBackend::Api => Arc::new(ApiRuntime::connect(timeout, long_timeout)?),
        };
        info!(backend = runtime.name(), "runtime client ready");
        Ok(Self::new(
            runtime,
            config.default_log_lines,
            config.max_log_lines,
        ))
    }

    pub fn backend(&self) -> &'static str {
        self.runtime.name()
    }

    // --- inventory ---

    /// Every container. A runtime failure is logged and reported as an empty list.
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    pub async fn list_containers(&self) -> Vec<Container> {
        match self.runtime.list_containers().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "container listing failed, returning empty inventory");
                Vec::new()
            }
        }
    }

    /// Inventory with a stats record on each running container, from one aggregate stats query.
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers_with_stats"))]
    pub async fn list_containers_with_stats(&self) -> Vec<Container> {
        let mut containers = self.list_containers().await;
        if !containers.iter().any(|c| c.state.is_running()) {
            return containers;
        }
        let samples = match self.runtime.container_stats(None).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "stats query failed, listing without stats");
                return containers;
            }
        };
        let mut by_key: HashMap<&str, ContainerResourceStats> = HashMap::new();
        for s in &samples {
            by_key.insert(s.id.as_str(), s.into());
            by_key.entry(s.name.as_str()).or_insert_with(|| s.into());
        }
        for c in containers.iter_mut() {
            let hit = by_key
                .get(c.id.as_str())
                .or_else(|| by_key.get(c.name.as_str()))
                .cloned();
            if let Some(stats) = hit {
                c.attach_stats(stats);
            }
        }
        containers
    }

    pub async fn container_counts(&self) -> ContainerCounts {
        ContainerCounts::from_inventory(&self.list_containers().await)
    }

    /// Every image. A runtime failure is logged and reported as an empty list.
    #[instrument(skip(self), fields(repo = "docker", operation = "list_images"))]
    pub async fn list_images(&self) -> Vec<Image> {
        match self.runtime.list_images().await {
            Ok(i) => i,
            Err(e) => {
                warn!(error = %e, "image listing failed, returning empty inventory");
                Vec::new()
            }
        }
    }

    // --- resources ---

    /// Stats of one running container. A listed container that is not running is a validation error.
    #[instrument(skip(self), fields(repo = "docker", operation = "container_stats"))]
    pub async fn container_stats(&self, id: &str) -> Result<ContainerResourceStats, RuntimeError> {
        check_id(id)?;
        let inventory = self.runtime.list_containers().await?;
        if let Some(c) = resolve_container(&inventory, id)
            && !c.state.is_running()
        {
            return Err(RuntimeError::Validation(format!("container {} is not running", id)));
        }
        let samples = self.runtime.container_stats(Some(id)).await?;
        samples
            .first()
            .map(ContainerResourceStats::from)
            .ok_or_else(|| RuntimeError::Parse(format!("no stats reported for container {}", id)))
    }

    /// Sum of usage over all running containers. CPU is a plain sum of per-container percentages.
    #[instrument(skip(self), fields(repo = "docker", operation = "docker_resources"))]
    pub async fn docker_resources(&self, host_total_memory_mb: u64) -> Result<DockerResources, RuntimeError> {
        let samples = self.runtime.container_stats(None).await?;
        let cpu: f64 = samples.iter().map(|s| s.cpu_percent).sum();
        let memory_mb: f64 = samples.iter().map(|s| s.memory_usage_mb).sum();
        let rx_kb: f64 = samples.iter().map(|s| s.network_rx_kb).sum();
        let tx_kb: f64 = samples.iter().map(|s| s.network_tx_kb).sum();
        let disk_bytes = self.disk_usage_bytes().await;
        Ok(DockerResources {
            cpu_usage: round_to(cpu, 1),
            memory_usage: memory_mb.round() as u64,
            memory_percentage: percent_of(memory_mb, host_total_memory_mb as f64).round() as u32,
            disk_usage: round_to(disk_bytes as f64 / GIB, 2),
            network_rx: rx_kb.round() as u64,
            network_tx: tx_kb.round() as u64,
        })
    }

    /// Runtime disk usage in bytes; 0 when the runtime cannot report it.
    pub async fn disk_usage_bytes(&self) -> u64 {
        match self.runtime.disk_usage_bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "disk usage query failed");
                0
            }
        }
    }

    // --- container actions ---

    #[instrument(skip(self), fields(repo = "docker", operation = "start"))]
    pub async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        check_id(id)?;
        self.runtime.start_container(id).await
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stop"))]
    pub async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        check_id(id)?;
        self.runtime.stop_container(id).await
    }

    /// Stop then start. A failed stop is returned as-is and start is not attempted.
    #[instrument(skip(self), fields(repo = "docker", operation = "restart"))]
    pub async fn restart_container(&self, id: &str) -> Result<(), RuntimeError> {
        check_id(id)?;
        self.runtime.stop_container(id).await?;
        self.runtime.start_container(id).await
    }

    /// Remove a container, stopping it first if it is running. Any failed step fails the whole call.
    #[instrument(skip(self), fields(repo = "docker", operation = "delete_container"))]
    pub async fn delete_container(&self, id: &str) -> Result<(), RuntimeError> {
        check_id(id)?;
        self.stop_then_remove(id)
            .await
            .map_err(|source| RuntimeError::DeleteFailed {
                id: id.to_string(),
                source: Box::new(source),
            })
    }

    async fn stop_then_remove(&self, id: &str) -> Result<(), RuntimeError> {
        let inventory = self.runtime.list_containers().await?;
        let running = resolve_container(&inventory, id).is_some_and(|c| c.state.is_running());
        if running {
            debug!(container = id, "stopping running container before removal");
            self.runtime.stop_container(id).await?;
        }
        self.runtime.remove_container(id).await
    }

    /// Last log lines (stdout and stderr), `lines` clamped to the configured maximum.
    #[instrument(skip(self), fields(repo = "docker", operation = "logs"))]
    pub async fn container_logs(&self, id: &str, lines: Option<usize>) -> Result<Vec<String>, RuntimeError> {
        check_id(id)?;
        let n = lines.unwrap_or(self.default_log_lines).clamp(1, self.max_log_lines);
        let raw = self.runtime.container_logs(id, n).await?;
        Ok(raw.lines().map(String::from).collect())
    }

    /// Validate the body, then create and start a container. Returns the new id.
    #[instrument(skip(self, body), fields(repo = "docker", operation = "run"))]
    pub async fn run_container(&self, body: RunContainerBody) -> Result<String, RuntimeError> {
        let request = run_request(body)?;
        let id = self.runtime.run_container(&request).await?;
        info!(container = %id, image = %request.image, "container created");
        Ok(id)
    }

    // --- image actions ---

    #[instrument(skip(self), fields(repo = "docker", operation = "pull"))]
    pub async fn pull_image(&self, name: &str) -> Result<(), RuntimeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RuntimeError::Validation("Image name is required".into()));
        }
        check_id(name)?;
        self.runtime.pull_image(name).await?;
        info!(image = name, "image pulled");
        Ok(())
    }

    /// Force-remove an image. In-use and not-found failures come back as ordinary errors.
    #[instrument(skip(self), fields(repo = "docker", operation = "delete_image"))]
    pub async fn delete_image(&self, id: &str) -> Result<(), RuntimeError> {
        check_id(id)?;
        self.runtime.remove_image(id).await
    }

    /// Build an image. Inline Dockerfile content is written to a fresh temp directory used as the
    /// context; the directory is removed afterwards and a failed removal is only logged.
    #[instrument(skip(self, body), fields(repo = "docker", operation = "build"))]
    pub async fn build_image(&self, body: BuildImageBody) -> Result<String, RuntimeError> {
        let name = body.name.trim();
        if name.is_empty() {
            return Err(RuntimeError::Validation("Image name is required".into()));
        }
        check_id(name)?;
        let tag = match body.tag.trim() {
            "" => "latest",
            t => t,
        };
        let reference = format!("{}:{}", name, tag);
        let build_args = split_lines(body.build_args.as_deref());

        if let Some(content) = body.dockerfile_content.as_deref().filter(|c| !c.trim().is_empty()) {
            let dir = tempfile::Builder::new().prefix("dockhand-build-").tempdir()?;
            let dockerfile = dir.path().join("Dockerfile");
            tokio::fs::write(&dockerfile, content).await?;
            let request = BuildRequest {
                tag: reference,
                dockerfile,
                context: dir.path().to_path_buf(),
                build_args,
            };
            let result = self.runtime.build_image(&request).await;
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "failed to remove build directory");
            }
            return result;
        }

        let dockerfile = body
            .dockerfile_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                RuntimeError::Validation("Either dockerfilePath or dockerfileContent is required".into())
            })?;
        let context = body
            .build_context
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_context(&dockerfile));
        let request = BuildRequest {
            tag: reference,
            dockerfile,
            context,
            build_args,
        };
        self.runtime.build_image(&request).await
    }

    // --- batches ---

    /// Apply `action` to each id in order. One failure never stops the rest.
    #[instrument(skip(self, ids), fields(repo = "docker", operation = "batch", count = ids.len()))]
    pub async fn batch(&self, action: BatchAction, ids: &[String]) -> BatchResponse {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match action {
                BatchAction::StartContainer => self.start_container(id).await,
                BatchAction::StopContainer => self.stop_container(id).await,
                BatchAction::DeleteContainer => self.delete_container(id).await,
                BatchAction::DeleteImage => self.delete_image(id).await,
            };
            results.push(match outcome {
                Ok(()) => BatchItemResult {
                    id: id.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => {
                    warn!(id = %id, action = action.label(), error = %e, "batch item failed");
                    BatchItemResult {
                        id: id.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            });
        }
        results.into()
    }
}

/// Ids and names are passed as single arguments; reject ones a CLI would read as a flag.
fn check_id(id: &str) -> Result<(), RuntimeError> {
    if id.trim().is_empty() {
        return Err(RuntimeError::Validation("id must not be empty".into()));
    }
    if id.starts_with('-') {
        return Err(RuntimeError::Validation(format!("invalid id {:?}", id)));
    }
    Ok(())
}

/// Find the container the runtime would act on for `id`: exact id (a full id also matches its
/// listed short form), then exact name, then a unique id prefix. An ambiguous prefix is `None`.
fn resolve_container<'a>(inventory: &'a [Container], id: &str) -> Option<&'a Container> {
    let listed = || inventory.iter().filter(|c| !c.id.is_empty());
    if let Some(c) = listed().find(|c| c.id == id || id.starts_with(&c.id)) {
        return Some(c);
    }
    if let Some(c) = inventory.iter().find(|c| c.name == id) {
        return Some(c);
    }
    let mut prefixed = listed().filter(|c| c.id.starts_with(id));
    match (prefixed.next(), prefixed.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn split_list(s: Option<&str>, sep: char) -> Vec<&str> {
    s.unwrap_or_default()
        .split(sep)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_lines(s: Option<&str>) -> Vec<String> {
    split_list(s, '\n').into_iter().map(String::from).collect()
}

fn default_context(dockerfile: &Path) -> PathBuf {
    match dockerfile.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Turn the UI's free-form run body into a typed request.
pub fn run_request(body: RunContainerBody) -> Result<RunRequest, RuntimeError> {
    let image = body.image.trim();
    if image.is_empty() || SENTINEL_IMAGES.contains(&image) {
        return Err(RuntimeError::Validation("A valid image is required".into()));
    }
    check_id(image)?;
    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(n) = &name {
        check_id(n)?;
    }
    let ports = split_list(body.ports.as_deref(), ',')
        .into_iter()
        .map(PortMapping::parse)
        .collect();
    let volumes = split_list(body.volumes.as_deref(), ',')
        .into_iter()
        .map(|v| match v.split_once(':') {
            Some((host, container)) => VolumeMapping {
                host: host.to_string(),
                container: container.to_string(),
            },
            None => VolumeMapping {
                host: v.to_string(),
                container: String::new(),
            },
        })
        .collect();
    Ok(RunRequest {
        image: image.to_string(),
        name,
        ports,
        volumes,
        env: split_lines(body.env.as_deref()),
        restart_always: body.restart,
    })
}
