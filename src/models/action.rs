// Action Gateway request bodies, typed runtime requests and batch results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image values the UI sends when nothing usable was selected.
pub const SENTINEL_IMAGES: [&str; 2] = ["<none>:<none>", "null:null"];

/// POST /api/containers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContainerBody {
    #[serde(default)]
    pub image: String,
    pub name: Option<String>,
    /// Comma-separated `host:container` pairs.
    pub ports: Option<String>,
    /// Comma-separated `host:container` pairs.
    pub volumes: Option<String>,
    /// Newline-separated `KEY=VALUE` pairs.
    pub env: Option<String>,
    #[serde(default)]
    pub restart: bool,
}

/// POST /api/images/build
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildImageBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub dockerfile_path: Option<String>,
    pub build_context: Option<String>,
    /// Newline-separated `ARG=VALUE` pairs.
    pub build_args: Option<String>,
    pub dockerfile_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullImageBody {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchBody {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host: Option<String>,
    pub container: String,
}

impl PortMapping {
    /// Split `host:container` at the last colon; `8080:80`, `127.0.0.1:8080:80`, `80`.
    pub fn parse(spec: &str) -> Self {
        match spec.rsplit_once(':') {
            Some((host, container)) if !host.is_empty() => Self {
                host: Some(host.to_string()),
                container: container.to_string(),
            },
            Some((_, container)) => Self {
                host: None,
                container: container.to_string(),
            },
            None => Self {
                host: None,
                container: spec.to_string(),
            },
        }
    }

    pub fn to_flag_value(&self) -> String {
        match &self.host {
            Some(h) => format!("{}:{}", h, self.container),
            None => self.container.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMapping {
    pub host: String,
    pub container: String,
}

impl VolumeMapping {
    pub fn to_flag_value(&self) -> String {
        if self.container.is_empty() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.container)
        }
    }
}

/// Validated run request handed to a runtime client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    pub name: Option<String>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMapping>,
    /// `KEY=VALUE`
    pub env: Vec<String>,
    pub restart_always: bool,
}

/// Build request with the Dockerfile and context already resolved on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// `name:tag`
    pub tag: String,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    /// `ARG=VALUE`
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl From<Vec<BatchItemResult>> for BatchResponse {
    fn from(results: Vec<BatchItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContainerResponse {
    pub message: String,
    pub container_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_mapping_splits_at_last_colon() {
        assert_eq!(
            PortMapping::parse("8080:80"),
            PortMapping {
                host: Some("8080".into()),
                container: "80".into()
            }
        );
        assert_eq!(
            PortMapping::parse("127.0.0.1:8080:80/udp"),
            PortMapping {
                host: Some("127.0.0.1:8080".into()),
                container: "80/udp".into()
            }
        );
        assert_eq!(PortMapping::parse("80").host, None);
        assert_eq!(PortMapping::parse("8080:80").to_flag_value(), "8080:80");
    }

    #[test]
    fn batch_response_counts_outcomes() {
        let resp = BatchResponse::from(vec![
            BatchItemResult {
                id: "a".into(),
                success: true,
                error: None,
            },
            BatchItemResult {
                id: "b".into(),
                success: false,
                error: Some("boom".into()),
            },
        ]);
        assert_eq!(resp.succeeded, 1);
        assert_eq!(resp.failed, 1);
    }
}
