use std::future::Future;

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};
use service::{comments::CommentService, runtime, storage};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Prepare the environment, pick the comment store, and assemble the router.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    runtime::ensure_env(&cfg.server.static_dir, &cfg.storage)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let store = storage::build_store(&cfg.storage)?;
    let state = AppState { comments: CommentService::new(store) };
    Ok(routes::build_router(state, build_cors(), &cfg.server.static_dir))
}

/// Bind, serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;

    let listener = TcpListener::bind((cfg.server.host.as_str(), cfg.server.port))
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot bind {}:{}: {e}", cfg.server.host, cfg.server.port)))?;
    let addr = listener.local_addr()?;
    info!(%addr, static_dir = %cfg.server.static_dir, "comment board listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server drained");
    Ok(())
}
