// HTTP routes

mod auth;
mod containers;
mod extract;
mod http;
mod images;
mod system;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{SessionStore, UserStore};
use crate::config::{AppConfig, AuthConfig};
use crate::docker_repo::DockerRepo;
use crate::sysinfo_repo::SysinfoRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) docker: Arc<DockerRepo>,
    pub(crate) sysinfo: Arc<SysinfoRepo>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) auth: Arc<AuthConfig>,
}

pub fn app(
    docker: Arc<DockerRepo>,
    sysinfo: Arc<SysinfoRepo>,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    config: &AppConfig,
) -> Router {
    let state = AppState {
        docker,
        sysinfo,
        users,
        sessions,
        auth: Arc::new(config.auth.clone()),
    };
    Router::new()
        .route("/", get(|| async { "dockhand" })) // GET /
        .route("/health", get(http::health_handler)) // GET /health
        .route("/version", get(http::version_handler)) // GET /version
        // session
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/status", get(auth::status))
        // containers
        .route(
            "/api/containers",
            get(containers::list).post(containers::run),
        )
        .route("/api/containers/stats", get(containers::counts))
        .route("/api/containers/batch", delete(containers::batch_delete))
        .route("/api/containers/batch/start", post(containers::batch_start))
        .route("/api/containers/batch/stop", post(containers::batch_stop))
        .route("/api/containers/{id}", delete(containers::delete))
        .route("/api/containers/{id}/start", post(containers::start))
        .route("/api/containers/{id}/stop", post(containers::stop))
        .route("/api/containers/{id}/restart", post(containers::restart))
        .route("/api/containers/{id}/logs", get(containers::logs))
        .route("/api/containers/{id}/stats", get(containers::stats))
        // images
        .route("/api/images", get(images::list))
        .route("/api/images/batch", delete(images::batch_delete))
        .route("/api/images/pull", post(images::pull))
        .route("/api/images/build", post(images::build))
        .route("/api/images/{id}", delete(images::delete))
        // host and runtime usage
        .route("/api/stats", get(system::stats))
        .route("/api/system/specs", get(system::specs))
        .route("/api/docker/resources", get(system::docker_resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
