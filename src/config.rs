use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Which runtime client backs the inventory and action gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeBackend {
    /// Shell out to the runtime CLI (`docker ...`).
    #[default]
    Cli,
    /// Talk to the Docker Engine API over the local socket.
    Api,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: RuntimeBackend,
    /// CLI binary name or path (CLI backend only).
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Upper bound for any single runtime invocation.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Upper bound for image builds, which routinely outlast ordinary commands.
    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,
    #[serde(default = "default_log_lines")]
    pub default_log_lines: usize,
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: RuntimeBackend::default(),
            binary: default_binary(),
            command_timeout_secs: default_command_timeout_secs(),
            build_timeout_secs: default_build_timeout_secs(),
            default_log_lines: default_log_lines(),
            max_log_lines: default_max_log_lines(),
        }
    }
}

fn default_binary() -> String {
    "docker".into()
}

fn default_command_timeout_secs() -> u64 {
    60
}

fn default_build_timeout_secs() -> u64 {
    1800
}

fn default_log_lines() -> usize {
    100
}

fn default_max_log_lines() -> usize {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The single seeded user.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Adds `Secure` to the session cookie; enable behind TLS.
    #[serde(default)]
    pub secure_cookie: bool,
    /// How often expired sessions are dropped from the store.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
            session_ttl_secs: default_session_ttl_secs(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_username() -> String {
    "nub-coders".into()
}

fn default_password() -> String {
    "Dev".into()
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_cookie_name() -> String {
    "dockhand.sid".into()
}

fn default_purge_interval_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            !self.runtime.binary.trim().is_empty(),
            "runtime.binary must be non-empty"
        );
        anyhow::ensure!(
            self.runtime.command_timeout_secs > 0,
            "runtime.command_timeout_secs must be > 0, got {}",
            self.runtime.command_timeout_secs
        );
        anyhow::ensure!(
            self.runtime.build_timeout_secs > 0,
            "runtime.build_timeout_secs must be > 0, got {}",
            self.runtime.build_timeout_secs
        );
        anyhow::ensure!(
            self.runtime.default_log_lines > 0,
            "runtime.default_log_lines must be > 0, got {}",
            self.runtime.default_log_lines
        );
        anyhow::ensure!(
            self.runtime.max_log_lines >= self.runtime.default_log_lines,
            "runtime.max_log_lines must be >= runtime.default_log_lines ({}), got {}",
            self.runtime.default_log_lines,
            self.runtime.max_log_lines
        );
        anyhow::ensure!(
            !self.auth.username.is_empty(),
            "auth.username must be non-empty"
        );
        anyhow::ensure!(
            !self.auth.password.is_empty(),
            "auth.password must be non-empty"
        );
        anyhow::ensure!(
            self.auth.session_ttl_secs > 0,
            "auth.session_ttl_secs must be > 0, got {}",
            self.auth.session_ttl_secs
        );
        anyhow::ensure!(
            is_cookie_token(&self.auth.cookie_name),
            "auth.cookie_name must be a non-empty cookie token, got {:?}",
            self.auth.cookie_name
        );
        anyhow::ensure!(
            self.auth.purge_interval_secs > 0,
            "auth.purge_interval_secs must be > 0, got {}",
            self.auth.purge_interval_secs
        );
        Ok(())
    }
}

// RFC 6265 cookie-name token: visible ASCII without separators.
fn is_cookie_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}
