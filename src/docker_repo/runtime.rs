// Runtime client capability. The gateway talks only to this trait; the CLI shim and the
// native Engine API client are interchangeable behind it.

use crate::error::RuntimeError;
use crate::models::{BuildRequest, Container, Image, RunRequest, StatsSample};
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Short label for logs ("cli", "api").
    fn name(&self) -> &'static str;

    /// All containers, running or not.
    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError>;

    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Last `lines` lines of combined stdout/stderr.
    async fn container_logs(&self, id: &str, lines: usize) -> Result<String, RuntimeError>;

    /// Create and start a detached container; returns its id.
    async fn run_container(&self, request: &RunRequest) -> Result<String, RuntimeError>;

    async fn pull_image(&self, name: &str) -> Result<(), RuntimeError>;

    async fn remove_image(&self, id: &str) -> Result<(), RuntimeError>;

    /// Build from an on-disk context; returns the runtime's build output.
    async fn build_image(&self, request: &BuildRequest) -> Result<String, RuntimeError>;

    /// One-shot stats for one container, or every running container when `id` is None.
    async fn container_stats(&self, id: Option<&str>) -> Result<Vec<StatsSample>, RuntimeError>;

    /// Total runtime disk usage in bytes.
    async fn disk_usage_bytes(&self) -> Result<u64, RuntimeError>;
}
