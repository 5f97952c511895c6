use anyhow::Result;
use dockhand::auth::{MemSessionStore, MemUserStore, SessionStore, spawn_session_purger};
use dockhand::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let docker_repo = Arc::new(
        docker_repo::DockerRepo::from_config(&app_config.runtime)
            .map_err(|e| anyhow::anyhow!("runtime client: {}", e))?,
    );
    let sysinfo_repo = Arc::new(sysinfo_repo::SysinfoRepo::new());
    let users = Arc::new(MemUserStore::seeded(&app_config.auth));
    let sessions: Arc<dyn SessionStore> = Arc::new(MemSessionStore::new());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let purger_handle = spawn_session_purger(
        sessions.clone(),
        Duration::from_secs(app_config.auth.purge_interval_secs),
        shutdown_rx,
    );

    let app = routes::app(docker_repo, sysinfo_repo, users, sessions, &app_config);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(());
    let _ = purger_handle.await;
    Ok(())
}
