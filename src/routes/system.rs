// Host and Docker resource usage

use axum::{Json, extract::State};

use super::AppState;
use super::extract::SessionUser;
use crate::error::ApiResult;
use crate::models::{DockerDiskBlock, DockerResources, SystemSpecs, SystemStats, percent_of};

/// GET /api/stats. The docker block is runtime disk usage against the root filesystem.
pub(super) async fn stats(_user: SessionUser, State(state): State<AppState>) -> ApiResult<Json<SystemStats>> {
    let host = state.sysinfo.get_host_usage().await?;
    let used = state.docker.disk_usage_bytes().await;
    let total = host.storage.total;
    Ok(Json(SystemStats {
        cpu: host.cpu,
        memory: host.memory,
        storage: host.storage,
        docker: DockerDiskBlock {
            total,
            used,
            percent: percent_of(used as f64, total as f64),
        },
    }))
}

/// GET /api/system/specs
pub(super) async fn specs(_user: SessionUser, State(state): State<AppState>) -> ApiResult<Json<SystemSpecs>> {
    Ok(Json(state.sysinfo.get_system_specs().await?))
}

/// GET /api/docker/resources
pub(super) async fn docker_resources(
    _user: SessionUser,
    State(state): State<AppState>,
) -> ApiResult<Json<DockerResources>> {
    let host_memory_mb = state.sysinfo.total_memory_mb().await?;
    Ok(Json(state.docker.docker_resources(host_memory_mb).await?))
}
