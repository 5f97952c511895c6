// CLI shim: every operation is one invocation of the runtime binary.

use super::command::CommandRunner;
use super::parse;
use super::runtime::RuntimeClient;
use crate::error::RuntimeError;
use crate::models::{BuildRequest, Container, Image, RunRequest, StatsSample};
use async_trait::async_trait;
use std::time::Duration;

pub struct CliRuntime {
    runner: CommandRunner,
    /// Bound for pulls and builds.
    long_timeout: Duration,
}

impl CliRuntime {
    pub fn new(runner: CommandRunner, long_timeout: Duration) -> Self {
        Self {
            runner,
            long_timeout,
        }
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    async fn run(&self, args: Vec<String>) -> Result<String, RuntimeError> {
        Ok(self.runner.run(&args).await?.stdout)
    }
}

fn argv<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn run_args(request: &RunRequest) -> Vec<String> {
    let mut args = argv(["run", "-d"]);
    if let Some(name) = &request.name {
        args.push("--name".into());
        args.push(name.clone());
    }
    for p in &request.ports {
        args.push("-p".into());
        args.push(p.to_flag_value());
    }
    for v in &request.volumes {
        args.push("-v".into());
        args.push(v.to_flag_value());
    }
    for e in &request.env {
        args.push("-e".into());
        args.push(e.clone());
    }
    if request.restart_always {
        args.push("--restart".into());
        args.push("always".into());
    }
    args.push(request.image.clone());
    args
}

pub(crate) fn build_args(request: &BuildRequest) -> Vec<String> {
    let mut args = argv(["build", "-t"]);
    args.push(request.tag.clone());
    args.push("-f".into());
    args.push(request.dockerfile.to_string_lossy().into_owned());
    for a in &request.build_args {
        args.push("--build-arg".into());
        args.push(a.clone());
    }
    args.push(request.context.to_string_lossy().into_owned());
    args
}

fn join_streams(stdout: String, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        return stdout;
    }
    let mut out = stdout;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(stderr);
    out
}

#[async_trait]
impl RuntimeClient for CliRuntime {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn list_containers(&self) -> Result<Vec<Container>, RuntimeError> {
        let out = self
            .run(argv(["ps", "-a", "--format", parse::CONTAINER_FORMAT]))
            .await?;
        Ok(parse::parse_containers(&out))
    }

    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError> {
        let out = self
            .run(argv(["images", "--format", parse::IMAGE_FORMAT]))
            .await?;
        Ok(parse::parse_images(&out))
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(argv(["start", id])).await.map(drop)
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(argv(["stop", id])).await.map(drop)
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(argv(["rm", id])).await.map(drop)
    }

    async fn container_logs(&self, id: &str, lines: usize) -> Result<String, RuntimeError> {
        let tail = lines.to_string();
        // The runtime replays the container's stderr on its own stderr.
        let out = self.runner.run(&argv(["logs", "--tail", &tail, id])).await?;
        Ok(join_streams(out.stdout, &out.stderr))
    }

    async fn run_container(&self, request: &RunRequest) -> Result<String, RuntimeError> {
        let out = self.run(run_args(request)).await?;
        out.lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(String::from)
            .ok_or_else(|| RuntimeError::Parse("run printed no container id".into()))
    }

    async fn pull_image(&self, name: &str) -> Result<(), RuntimeError> {
        self.runner
            .run_with_timeout(&argv(["pull", name]), self.long_timeout)
            .await
            .map(drop)
    }

    async fn remove_image(&self, id: &str) -> Result<(), RuntimeError> {
        self.run(argv(["rmi", "-f", id])).await.map(drop)
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<String, RuntimeError> {
        let out = self
            .runner
            .run_with_timeout(&build_args(request), self.long_timeout)
            .await?;
        Ok(join_streams(out.stdout, &out.stderr))
    }

    async fn container_stats(&self, id: Option<&str>) -> Result<Vec<StatsSample>, RuntimeError> {
        let mut args = argv(["stats", "--no-stream", "--format", parse::STATS_FORMAT]);
        if let Some(id) = id {
            args.push(id.to_string());
        }
        let out = self.run(args).await?;
        Ok(parse::parse_stats(&out))
    }

    async fn disk_usage_bytes(&self) -> Result<u64, RuntimeError> {
        let out = self
            .run(argv(["system", "df", "--format", parse::DISK_USAGE_FORMAT]))
            .await?;
        Ok(parse::parse_disk_usage(&out))
    }
}
