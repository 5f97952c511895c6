// Config loading and validation tests

use dockhand::config::{AppConfig, RuntimeBackend};

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[runtime]
backend = "cli"
binary = "docker"
command_timeout_secs = 60
build_timeout_secs = 1800
default_log_lines = 100
max_log_lines = 5000

[auth]
username = "nub-coders"
password = "Dev"
session_ttl_secs = 86400
cookie_name = "dockhand.sid"
purge_interval_secs = 3600
"#;

fn rejects(bad: &str, key: &str) {
    let err = AppConfig::load_from_str(bad).unwrap_err();
    assert!(
        err.to_string().contains(key),
        "expected error mentioning {}, got: {}",
        key,
        err
    );
}

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.runtime.backend, RuntimeBackend::Cli);
    assert_eq!(config.runtime.binary, "docker");
    assert_eq!(config.runtime.max_log_lines, 5000);
    assert_eq!(config.auth.username, "nub-coders");
    assert_eq!(config.auth.session_ttl_secs, 86400);
    assert!(!config.auth.secure_cookie);
}

#[test]
fn test_config_defaults_when_sections_missing() {
    let config = AppConfig::load_from_str("[server]\nport = 3000\nhost = \"127.0.0.1\"\n")
        .expect("minimal config");
    assert_eq!(config.runtime.backend, RuntimeBackend::Cli);
    assert_eq!(config.runtime.binary, "docker");
    assert_eq!(config.runtime.default_log_lines, 100);
    assert_eq!(config.auth.username, "nub-coders");
    assert_eq!(config.auth.password, "Dev");
    assert_eq!(config.auth.cookie_name, "dockhand.sid");
    assert_eq!(config.auth.session_ttl_secs, 24 * 60 * 60);
}

#[test]
fn test_config_api_backend() {
    let config =
        AppConfig::load_from_str(&VALID_CONFIG.replace("backend = \"cli\"", "backend = \"api\""))
            .unwrap();
    assert_eq!(config.runtime.backend, RuntimeBackend::Api);
}

#[test]
fn test_config_rejects_unknown_backend() {
    assert!(
        AppConfig::load_from_str(&VALID_CONFIG.replace("backend = \"cli\"", "backend = \"podman\""))
            .is_err()
    );
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    rejects(&VALID_CONFIG.replace("port = 8081", "port = 0"), "server.port");
}

#[test]
fn test_config_validation_rejects_empty_host() {
    rejects(
        &VALID_CONFIG.replace("host = \"0.0.0.0\"", "host = \"\""),
        "server.host",
    );
}

#[test]
fn test_config_validation_rejects_empty_binary() {
    rejects(
        &VALID_CONFIG.replace("binary = \"docker\"", "binary = \"  \""),
        "runtime.binary",
    );
}

#[test]
fn test_config_validation_rejects_zero_timeouts() {
    rejects(
        &VALID_CONFIG.replace("command_timeout_secs = 60", "command_timeout_secs = 0"),
        "command_timeout_secs",
    );
    rejects(
        &VALID_CONFIG.replace("build_timeout_secs = 1800", "build_timeout_secs = 0"),
        "build_timeout_secs",
    );
}

#[test]
fn test_config_validation_rejects_log_line_bounds() {
    rejects(
        &VALID_CONFIG.replace("default_log_lines = 100", "default_log_lines = 0"),
        "default_log_lines",
    );
    rejects(
        &VALID_CONFIG.replace("max_log_lines = 5000", "max_log_lines = 50"),
        "max_log_lines",
    );
}

#[test]
fn test_config_validation_rejects_empty_credentials() {
    rejects(
        &VALID_CONFIG.replace("username = \"nub-coders\"", "username = \"\""),
        "auth.username",
    );
    rejects(
        &VALID_CONFIG.replace("password = \"Dev\"", "password = \"\""),
        "auth.password",
    );
}

#[test]
fn test_config_validation_rejects_zero_session_ttl() {
    rejects(
        &VALID_CONFIG.replace("session_ttl_secs = 86400", "session_ttl_secs = 0"),
        "session_ttl_secs",
    );
}

#[test]
fn test_config_validation_rejects_bad_cookie_name() {
    rejects(
        &VALID_CONFIG.replace("cookie_name = \"dockhand.sid\"", "cookie_name = \"my session\""),
        "cookie_name",
    );
    rejects(
        &VALID_CONFIG.replace("cookie_name = \"dockhand.sid\"", "cookie_name = \"a;b\""),
        "cookie_name",
    );
}

#[test]
fn test_config_validation_rejects_zero_purge_interval() {
    rejects(
        &VALID_CONFIG.replace("purge_interval_secs = 3600", "purge_interval_secs = 0"),
        "purge_interval_secs",
    );
}

#[test]
fn test_config_file_at_repo_root_is_valid() {
    let s = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"))
        .expect("config.toml");
    AppConfig::load_from_str(&s).expect("shipped config.toml validates");
}
