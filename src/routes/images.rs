// Image inventory, pull, build and delete

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::AppState;
use super::extract::SessionUser;
use crate::docker_repo::BatchAction;
use crate::error::{ApiError, ApiResult};
use crate::models::{BatchBody, BatchResponse, BuildImageBody, Image, MessageResponse, PullImageBody};

/// GET /api/images
pub(super) async fn list(_user: SessionUser, State(state): State<AppState>) -> Json<Vec<Image>> {
    Json(state.docker.list_images().await)
}

/// DELETE /api/images/{id}
pub(super) async fn delete(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.docker.delete_image(&id).await?;
    tracing::info!(user = %user.user.username, image = %id, "image deleted");
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}

/// DELETE /api/images/batch
pub(super) async fn batch_delete(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(state.docker.batch(BatchAction::DeleteImage, &body.ids).await))
}

/// POST /api/images/pull
pub(super) async fn pull(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<PullImageBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    state.docker.pull_image(&body.name).await?;
    Ok(Json(MessageResponse::new(format!(
        "Image {} pulled successfully",
        body.name.trim()
    ))))
}

/// POST /api/images/build
pub(super) async fn build(
    _user: SessionUser,
    State(state): State<AppState>,
    body: Result<Json<BuildImageBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let output = state.docker.build_image(body).await?;
    tracing::debug!(output_bytes = output.len(), "image build finished");
    Ok(Json(MessageResponse::new("Image built successfully")))
}
