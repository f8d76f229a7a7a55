use std::{future::Future, sync::Arc};

use axum::Router;
use configs::AppConfig;
use service::{JsonUserRepository, UserRepository};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{routes, state::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the user collection named by the config, or an in-memory one when
/// no path is set.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let repo: Arc<dyn UserRepository> = match cfg.storage.path.as_deref() {
        Some(path) => {
            common::env::ensure_data_dir(path).await?;
            let repo = JsonUserRepository::open(path).await?;
            info!(path, users = repo.count().await, "user store opened");
            Arc::new(repo)
        }
        None => {
            warn!("no storage path configured, users are kept in memory only");
            Arc::new(JsonUserRepository::in_memory())
        }
    };
    Ok(ServerState::new(repo))
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Serve `app` until `shutdown` resolves. In-flight requests are drained first.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, shutdown signal disabled");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "user api listening");
    serve(listener, app, shutdown_signal()).await
}
