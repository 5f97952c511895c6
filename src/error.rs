// Error taxonomy: runtime/domain errors and their mapping to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Tagged error kind carried from the runtime layer to the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RuntimeUnavailable,
    CommandFailed,
    Validation,
    Parse,
    /// Host sampling or other in-process failure.
    Internal,
}

/// Failure of a container-runtime operation (CLI shim or native API).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container runtime `{0}` is not installed or not on PATH")]
    Unavailable(String),

    #[error("`{command}` failed ({}): {stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(String),

    #[error("unexpected runtime output: {0}")]
    Parse(String),

    #[error("failed to delete container {id}: {source}")]
    DeleteFailed {
        id: String,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("{0} is not supported by this runtime client")]
    Unsupported(&'static str),

    #[error("docker api: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {}", c),
        None => "terminated by signal".to_string(),
    }
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Unavailable(_) => ErrorKind::RuntimeUnavailable,
            RuntimeError::Validation(_) => ErrorKind::Validation,
            RuntimeError::Parse(_) => ErrorKind::Parse,
            RuntimeError::DeleteFailed { source, .. } if source.kind() == ErrorKind::RuntimeUnavailable => {
                ErrorKind::RuntimeUnavailable
            }
            RuntimeError::CommandFailed { .. }
            | RuntimeError::Timeout { .. }
            | RuntimeError::Spawn { .. }
            | RuntimeError::DeleteFailed { .. }
            | RuntimeError::Unsupported(_)
            | RuntimeError::Api(_)
            | RuntimeError::Io(_) => ErrorKind::CommandFailed,
        }
    }
}

/// JSON error body: `{"message": ..., "kind": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: ErrorKind,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session, or the session expired.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("host metrics unavailable: {0}")]
    Host(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => ErrorKind::Auth,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Runtime(e) => e.kind(),
            ApiError::Host(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::RuntimeUnavailable
            | ErrorKind::CommandFailed
            | ErrorKind::Parse
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(kind = ?self.kind(), error = %self, "request failed");
        }
        let body = ErrorBody {
            message: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
