// Container inventory, lifecycle actions, logs and batches

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::Deserialize;

use super::AppState;
use super::extract::SessionUser;
use crate::docker_repo::BatchAction;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    BatchBody, BatchResponse, Container, ContainerCounts, ContainerResourceStats, LogsResponse,
    MessageResponse, RunContainerBody, RunContainerResponse,
};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    stats: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LogsQuery {
    lines: Option<String>,
}

/// GET /api/containers[?stats=true]
pub(super) async fn list(
    _user: SessionUser,
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Json<Vec<Container>> {
    let containers = if q.stats {
        state.docker.list_containers_with_stats().await
    } else {
        state.docker.list_containers().await
    };
    Json(containers)
}

/// GET /api/containers/stats
pub(super) async fn counts(_user: SessionUser, State(state): State<AppState>) -> Json<ContainerCounts> {
    Json(state.docker.container_counts().await)
}

/// POST /api/containers
pub(super) async fn run(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<RunContainerBody>, JsonRejection>,
) -> ApiResult<Json<RunContainerResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let container_id = state.docker.run_container(body).await?;
    Ok(Json(RunContainerResponse {
        message: "Container created successfully".into(),
        container_id,
    }))
}

/// POST /api/containers/{id}/start
pub(super) async fn start(
    _user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.docker.start_container(&id).await?;
    Ok(Json(MessageResponse::new("Container started successfully")))
}

/// POST /api/containers/{id}/stop
pub(super) async fn stop(
    _user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.docker.stop_container(&id).await?;
    Ok(Json(MessageResponse::new("Container stopped successfully")))
}

/// POST /api/containers/{id}/restart
pub(super) async fn restart(
    _user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.docker.restart_container(&id).await?;
    Ok(Json(MessageResponse::new("Container restarted successfully")))
}

/// DELETE /api/containers/{id}
pub(super) async fn delete(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.docker.delete_container(&id).await?;
    tracing::info!(user = %user.user.username, container = %id, "container deleted");
    Ok(Json(MessageResponse::new("Container deleted successfully")))
}

/// GET /api/containers/{id}/logs?lines=N. A missing or unparseable `lines` uses the default.
pub(super) async fn logs(
    _user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<LogsQuery>,
) -> ApiResult<Json<LogsResponse>> {
    let lines = q.lines.as_deref().and_then(|l| l.trim().parse().ok());
    let logs = state.docker.container_logs(&id, lines).await?;
    Ok(Json(LogsResponse { logs }))
}

/// GET /api/containers/{id}/stats
pub(super) async fn stats(
    _user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContainerResourceStats>> {
    Ok(Json(state.docker.container_stats(&id).await?))
}

async fn batch(
    state: &AppState,
    action: BatchAction,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(state.docker.batch(action, &body.ids).await))
}

/// POST /api/containers/batch/start
pub(super) async fn batch_start(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    batch(&state, BatchAction::StartContainer, body).await
}

/// POST /api/containers/batch/stop
pub(super) async fn batch_stop(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    batch(&state, BatchAction::StopContainer, body).await
}

/// DELETE /api/containers/batch
pub(super) async fn batch_delete(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    batch(&state, BatchAction::DeleteContainer, body).await
}
