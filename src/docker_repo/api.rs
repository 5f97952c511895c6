// Native Docker Engine API client (bollard). Selected with `runtime.backend = "api"`.

use super::parse::format_size;
use super::runtime::RuntimeClient;
use super::stats::sample_from_response;
use crate::error::RuntimeError;
use crate::models::{
    BuildRequest, Container, ContainerState, Image, PortMapping, RunRequest, StatsSample,
};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, ListContainersOptions, ListImagesOptions,
    LogsOptions, RemoveContainerOptions, RemoveImageOptions, StartContainerOptions, StatsOptions,
    StopContainerOptions,
};
use futures_util::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{instrument, warn};

/// Ids are shortened to what `docker ps` prints so both backends agree.
const SHORT_ID_LEN: usize = 12;

pub struct ApiRuntime {
    docker: Docker,
    timeout: Duration,
    long_timeout: Duration,
}

impl ApiRuntime {
    /// Connect using DOCKER_HOST or the platform default socket.
    pub fn connect(timeout: Duration, long_timeout: Duration) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(classify)?
            .with_timeout(long_timeout);
        Ok(Self {
            docker,
            timeout,
            long_timeout,
        })
    }

    async fn bounded<T, F>(&self, what: &str, limit: Duration, fut: F) -> Result<T, RuntimeError>
    where
        F: Future<Output = Result<T, bollard::errors::Error>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(classify),
            Err(_) => {
                warn!(operation = what, timeout_secs = limit.as_secs(), "docker api call timed out");
                Err(RuntimeError::Timeout {
                    command: format!("docker api {}", what),
                    secs: limit.as_secs(),
                })
            }
        }
    }

    async fn stats_for(&self, id: &str) -> Result<Option<StatsSample>, RuntimeError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        let first = self
            .bounded("stats", self.timeout, async { stream.next().await.transpose() })
            .await?;
        Ok(first.and_then(|s| {
            let name = s.name.clone().unwrap_or_else(|| id.to_string());
            sample_from_response(&s, &short_id(id), &name)
        }))
    }
}

fn classify(e: bollard::errors::Error) -> RuntimeError {
    match e {
        bollard::errors::Error::SocketNotFoundError(path) => RuntimeError::Unavailable(path),
        other => RuntimeError::Api(other),
    }
}

fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(SHORT_ID_LEN).collect()
}

fn format_created(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S %z UTC").to_string())
        .unwrap_or_default()
}

/// Render one published port the way `docker ps` does, e.g. `0.0.0.0:8080->80/tcp`.
fn format_port(ip: Option<&str>, public: Option<u16>, private: u16, proto: &str) -> String {
    match public {
        Some(p) => format!("{}:{}->{}/{}", ip.unwrap_or("0.0.0.0"), p, private, proto),
        None => format!("{}/{}", private, proto),
    }
}

/// `repo:tag` split at the tag colon; registry ports stay in the repository.
/// A digest (`repo@sha256:...`) takes the tag's place and wins over any tag.
fn split_reference(reference: &str) -> (String, String) {
    if let Some((name, digest)) = reference.split_once('@') {
        return (split_reference(name).0, digest.to_string());
    }
    match reference.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') && !repo.is_empty() => {
            (repo.to_string(), tag.to_string())
        }
        _ => (reference.to_string(), "latest".to_string()),
    }
}

fn port_bindings(ports: &[PortMapping]) -> HashMap<String, Option<Vec<PortBinding>>> {
    let mut out: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    for p in ports {
        let key = if p.container.contains('/') {
            p.container.clone()
        } else {
            format!("{}/tcp", p.container)
        };
        let binding = match p.host.as_deref().map(|h| h.rsplit_once(':').unwrap_or(("", h))) {
            Some((ip, port)) => PortBinding {
                host_ip: (!ip.is_empty()).then(|| ip.to_string()),
                host_port: Some(port.to_string()),
            },
            None => PortBinding {
                host_ip: None,
                host_port: None,
            },
        };
        out.entry(key).or_insert_with(|| Some(Vec::new())).get_or_insert_with(Vec::new).push(binding);
    }
    out
}

#[async_trait]
impl RuntimeClient for ApiRuntime {
    fn name(&self) -> &'static str {
        "api"
    }

    #[instrument(skip(self), fields(repo = "docker_api", operation = "list_containers"))]
    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let summaries = self
            .bounded("list_containers", self.timeout, self.docker.list_containers(Some(options)))
            .await?;
        Ok(summaries
            .into_iter()
            .map(|c| {
                let id = short_id(c.id.as_deref().unwrap_or_default());
                let name = c
                    .names
                    .as_ref()
                    .and_then(|n| n.first())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_else(|| id.clone());
                let status = c.status.unwrap_or_default();
                let ports = c
                    .ports
                    .unwrap_or_default()
                    .iter()
                    .map(|p| {
                        let proto = p.typ.as_ref().map(|t| t.to_string()).unwrap_or_else(|| "tcp".into());
                        format_port(p.ip.as_deref(), p.public_port, p.private_port, &proto)
                    })
                    .collect();
                Container {
                    id,
                    name,
                    image: c.image.unwrap_or_default(),
                    state: ContainerState::from_status(&status),
                    status,
                    ports,
                    created: c.created.map(format_created).unwrap_or_default(),
                    stats: None,
                }
            })
            .collect())
    }

    #[instrument(skip(self), fields(repo = "docker_api", operation = "list_images"))]
    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError> {
        let summaries = self
            .bounded(
                "list_images",
                self.timeout,
                self.docker.list_images(Some(ListImagesOptions::default())),
            )
            .await?;
        Ok(summaries
            .into_iter()
            .map(|i| {
                let repo_tags: Vec<String> = i
                    .repo_tags
                    .into_iter()
                    .filter(|t| t != "<none>:<none>")
                    .collect();
                let (name, tag) = repo_tags
                    .first()
                    .map(|t| split_reference(t))
                    .unwrap_or_else(|| ("<none>".into(), "<none>".into()));
                let size_bytes = i.size.max(0) as u64;
                Image {
                    id: short_id(&i.id),
                    name,
                    tag,
                    repo_tags,
                    size: format_size(size_bytes),
                    size_bytes,
                    created: format_created(i.created),
                }
            })
            .collect())
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.bounded(
            "start",
            self.timeout,
            self.docker.start_container(id, None::<StartContainerOptions>),
        )
        .await
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.bounded(
            "stop",
            self.timeout,
            self.docker.stop_container(id, None::<StopContainerOptions>),
        )
        .await
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.bounded(
            "remove",
            self.timeout,
            self.docker.remove_container(id, None::<RemoveContainerOptions>),
        )
        .await
    }

    async fn container_logs(&self, id: &str, lines: usize) -> Result<String, RuntimeError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            tail: lines.to_string(),
            ..Default::default()
        };
        let chunks: Vec<_> = self
            .bounded(
                "logs",
                self.timeout,
                self.docker.logs(id, Some(options)).try_collect(),
            )
            .await?;
        Ok(chunks.iter().map(|c| c.to_string()).collect())
    }

    #[instrument(skip(self, request), fields(repo = "docker_api", operation = "run", image = %request.image))]
    async fn run_container(&self, request: &RunRequest) -> Result<String, RuntimeError> {
        let host_config = HostConfig {
            binds: (!request.volumes.is_empty())
                .then(|| request.volumes.iter().map(|v| v.to_flag_value()).collect()),
            port_bindings: (!request.ports.is_empty()).then(|| port_bindings(&request.ports)),
            restart_policy: request.restart_always.then(|| RestartPolicy {
                name: Some(RestartPolicyNameEnum::ALWAYS),
                ..Default::default()
            }),
            ..Default::default()
        };
        let body = ContainerCreateBody {
            image: Some(request.image.clone()),
            env: (!request.env.is_empty()).then(|| request.env.clone()),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: request.name.clone(),
            ..Default::default()
        };
        let created = self
            .bounded(
                "create",
                self.timeout,
                self.docker.create_container(Some(options), body),
            )
            .await?;
        self.start_container(&created.id).await?;
        Ok(short_id(&created.id))
    }

    #[instrument(skip(self), fields(repo = "docker_api", operation = "pull"))]
    async fn pull_image(&self, name: &str) -> Result<(), RuntimeError> {
        // Without a tag the API pulls every tag of the repository.
        let (repo, tag) = split_reference(name);
        let options = CreateImageOptions {
            from_image: Some(repo),
            tag: Some(tag),
            ..Default::default()
        };
        let _progress: Vec<_> = self
            .bounded(
                "pull",
                self.long_timeout,
                self.docker.create_image(Some(options), None, None).try_collect(),
            )
            .await?;
        Ok(())
    }

    async fn remove_image(&self, id: &str) -> Result<(), RuntimeError> {
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };
        self.bounded(
            "rmi",
            self.timeout,
            self.docker.remove_image(id, Some(options), None),
        )
        .await
        .map(drop)
    }

    async fn build_image(&self, _request: &BuildRequest) -> Result<String, RuntimeError> {
        Err(RuntimeError::Unsupported("image build"))
    }

    #[instrument(skip(self), fields(repo = "docker_api", operation = "stats"))]
    async fn container_stats(&self, id: Option<&str>) -> Result<Vec<StatsSample>, RuntimeError> {
        if let Some(id) = id {
            return Ok(self.stats_for(id).await?.into_iter().collect());
        }
        let options = ListContainersOptions {
            all: false,
            filters: Some(HashMap::from([(
                "status".to_string(),
                vec!["running".to_string()],
            )])),
            ..Default::default()
        };
        let running = self
            .bounded("list_containers", self.timeout, self.docker.list_containers(Some(options)))
            .await?;
        let mut samples = Vec::with_capacity(running.len());
        for c in running {
            let Some(id) = c.id else { continue };
            match self.stats_for(&id).await {
                Ok(Some(s)) => samples.push(s),
                Ok(None) => {}
                // A container may stop between listing and sampling.
                Err(e) => warn!(container = %short_id(&id), error = %e, "stats sample failed"),
            }
        }
        Ok(samples)
    }

    async fn disk_usage_bytes(&self) -> Result<u64, RuntimeError> {
        let images = self.list_images().await?;
        Ok(images.iter().map(|i| i.size_bytes).sum())
    }
}
