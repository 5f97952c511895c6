// Runs the container-runtime CLI: binary resolution, bounded execution, output capture.

use crate::error::RuntimeError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub struct CommandRunner {
    binary: String,
    timeout: Duration,
    resolved: OnceLock<PathBuf>,
}

impl CommandRunner {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            resolved: OnceLock::new(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Locate the binary. A hit is cached; a miss is re-checked on the next call so a runtime
    /// installed after startup is picked up.
    pub fn resolve(&self) -> Result<&Path, RuntimeError> {
        if let Some(p) = self.resolved.get() {
            return Ok(p.as_path());
        }
        let found = find_executable(&self.binary)
            .ok_or_else(|| RuntimeError::Unavailable(self.binary.clone()))?;
        Ok(self.resolved.get_or_init(|| found).as_path())
    }

    pub async fn run(&self, args: &[String]) -> Result<CommandOutput, RuntimeError> {
        self.run_with_timeout(args, self.timeout).await
    }

    /// Run with an explicit bound. The child is killed if the bound elapses.
    pub async fn run_with_timeout(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, RuntimeError> {
        let program = self.resolve()?.to_path_buf();
        let command = self.describe(args);

        let mut cmd = Command::new(&program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => {
                warn!(command = %command, timeout_secs = timeout.as_secs(), "runtime command timed out");
                return Err(RuntimeError::Timeout {
                    command,
                    secs: timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RuntimeError::Unavailable(self.binary.clone()));
            }
            Ok(Err(source)) => return Err(RuntimeError::Spawn { command, source }),
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            debug!(command = %command, code = ?output.status.code(), "runtime command failed");
            return Err(RuntimeError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        debug!(command = %command, stdout_bytes = stdout.len(), "runtime command ok");
        Ok(CommandOutput { stdout, stderr })
    }

    fn describe(&self, args: &[String]) -> String {
        let mut s = self.binary.clone();
        for a in args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// Resolve `name` like a shell would: paths are checked directly, bare names are searched on PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let p = PathBuf::from(name);
        return is_executable(&p).then_some(p);
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
