// Shared test helpers: a recording in-memory runtime and app wiring.

#![allow(dead_code)]

use async_trait::async_trait;
use dockhand::auth::{MemSessionStore, MemUserStore};
use dockhand::config::AppConfig;
use dockhand::docker_repo::{DockerRepo, RuntimeClient};
use dockhand::error::RuntimeError;
use dockhand::models::*;
use dockhand::routes;
use dockhand::sysinfo_repo::SysinfoRepo;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "127.0.0.1"

[runtime]
default_log_lines = 100
max_log_lines = 500

[auth]
username = "nub-coders"
password = "Dev"
session_ttl_secs = 3600
"#;

pub fn test_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

pub fn container(id: &str, name: &str, status: &str) -> Container {
    Container {
        id: id.into(),
        name: name.into(),
        image: "nginx:latest".into(),
        state: ContainerState::from_status(status),
        status: status.into(),
        ports: vec![],
        created: "2024-01-01 10:00:00 +0000 UTC".into(),
        stats: None,
    }
}

pub fn image(id: &str, name: &str, tag: &str) -> Image {
    Image {
        id: id.into(),
        name: name.into(),
        tag: tag.into(),
        repo_tags: vec![format!("{}:{}", name, tag)],
        size: "142MB".into(),
        size_bytes: 142 * 1024 * 1024,
        created: "2024-01-01 10:00:00 +0000 UTC".into(),
    }
}

pub fn sample(id: &str, name: &str, cpu: f64, mem_mb: f64) -> StatsSample {
    StatsSample {
        id: id.into(),
        name: name.into(),
        cpu_percent: cpu,
        memory_usage_mb: mem_mb,
        memory_limit_mb: 2048.0,
        memory_percent: mem_mb / 2048.0 * 100.0,
        network_rx_kb: 10.4,
        network_tx_kb: 2.0,
    }
}

/// Runtime double that records every call as `op` or `op:arg` and keeps container state.
/// An operation fails when `fail` contains either its bare name or `op:arg`.
#[derive(Default)]
pub struct FakeRuntime {
    pub calls: Mutex<Vec<String>>,
    pub containers: Mutex<Vec<Container>>,
    pub images: Mutex<Vec<Image>>,
    pub stats: Mutex<Vec<StatsSample>>,
    pub disk_bytes: Mutex<u64>,
    pub fail: Mutex<HashSet<String>>,
    pub last_run: Mutex<Option<RunRequest>>,
    pub last_build: Mutex<Option<BuildRequest>>,
    /// Dockerfile content as seen on disk while the build ran.
    pub built_dockerfile: Mutex<Option<String>>,
}

impl FakeRuntime {
    pub fn with_containers(containers: Vec<Container>) -> Arc<Self> {
        let fake = Self::default();
        *fake.containers.lock().unwrap() = containers;
        Arc::new(fake)
    }

    pub fn fail_on(&self, key: &str) {
        self.fail.lock().unwrap().insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, arg: Option<&str>) -> Result<(), RuntimeError> {
        let key = match arg {
            Some(a) => format!("{}:{}", op, a),
            None => op.to_string(),
        };
        self.calls.lock().unwrap().push(key.clone());
        let fail = self.fail.lock().unwrap();
        if fail.contains(op) || fail.contains(&key) {
            return Err(RuntimeError::CommandFailed {
                command: format!("docker {}", key.replace(':', " ")),
                code: Some(1),
                stderr: format!("simulated {} failure", op),
            });
        }
        Ok(())
    }

    fn set_status(&self, id: &str, status: &str) -> Result<(), RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        let i = locate(&containers, id).ok_or_else(|| RuntimeError::CommandFailed {
            command: format!("docker {}", id),
            code: Some(1),
            stderr: format!("No such container: {}", id),
        })?;
        containers[i].status = status.into();
        containers[i].state = ContainerState::from_status(status);
        Ok(())
    }
}

/// Exact id or name first, then id prefix.
fn locate(containers: &[Container], id: &str) -> Option<usize> {
    containers
        .iter()
        .position(|c| c.id == id || c.name == id)
        .or_else(|| containers.iter().position(|c| c.id.starts_with(id)))
}

#[async_trait]
impl RuntimeClient for FakeRuntime {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError> {
        self.record("list_containers", None)?;
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError> {
        self.record("list_images", None)?;
        Ok(self.images.lock().unwrap().clone())
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.record("start", Some(id))?;
        self.set_status(id, "Up 1 second")
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.record("stop", Some(id))?;
        self.set_status(id, "Exited (0) 1 second ago")
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.record("remove", Some(id))?;
        let mut containers = self.containers.lock().unwrap();
        if let Some(i) = locate(&containers, id) {
            containers.remove(i);
        }
        Ok(())
    }

    async fn container_logs(&self, id: &str, lines: usize) -> Result<String, RuntimeError> {
        self.record("logs", Some(&format!("{}:{}", id, lines)))?;
        Ok("first line\nsecond line\n".into())
    }

    async fn run_container(&self, request: &RunRequest) -> Result<String, RuntimeError> {
        self.record("run", Some(&request.image))?;
        *self.last_run.lock().unwrap() = Some(request.clone());
        Ok("0123456789ab".into())
    }

    async fn pull_image(&self, name: &str) -> Result<(), RuntimeError> {
        self.record("pull", Some(name))
    }

    async fn remove_image(&self, id: &str) -> Result<(), RuntimeError> {
        self.record("remove_image", Some(id))?;
        self.images.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<String, RuntimeError> {
        *self.last_build.lock().unwrap() = Some(request.clone());
        *self.built_dockerfile.lock().unwrap() = std::fs::read_to_string(&request.dockerfile).ok();
        self.record("build", Some(&request.tag))?;
        Ok("Successfully built".into())
    }

    async fn container_stats(&self, id: Option<&str>) -> Result<Vec<StatsSample>, RuntimeError> {
        self.record("stats", id)?;
        let stats = self.stats.lock().unwrap().clone();
        Ok(match id {
            Some(id) => stats.into_iter().filter(|s| s.id == id || s.name == id).collect(),
            None => stats,
        })
    }

    async fn disk_usage_bytes(&self) -> Result<u64, RuntimeError> {
        self.record("disk_usage", None)?;
        Ok(*self.disk_bytes.lock().unwrap())
    }
}

pub fn repo(fake: Arc<FakeRuntime>) -> DockerRepo {
    DockerRepo::new(fake, 100, 500)
}

/// Router over the given repo with fresh in-memory auth stores.
pub fn app_with_repo(docker: DockerRepo) -> axum::Router {
    app_with_config(docker, test_config())
}

pub fn app_with_config(docker: DockerRepo, config: AppConfig) -> axum::Router {
    routes::app(
        Arc::new(docker),
        Arc::new(SysinfoRepo::new()),
        Arc::new(MemUserStore::seeded(&config.auth)),
        Arc::new(MemSessionStore::new()),
        &config,
    )
}

pub fn app_with_fake(fake: Arc<FakeRuntime>) -> axum::Router {
    app_with_repo(repo(fake))
}
