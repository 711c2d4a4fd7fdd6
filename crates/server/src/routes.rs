use std::path::Path;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::comments::{CommentService, StoreStatus};

use crate::errors;

pub mod comments;

#[derive(Clone)]
pub struct AppState {
    pub comments: CommentService,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let status = match state.comments.store_status().await {
        StoreStatus::Reachable => "ok",
        StoreStatus::Unreachable(_) => "degraded",
    };
    Json(Health { status, store: state.comments.store_kind().as_str() })
}

/// Build the full application router: the comments API, health, and the
/// static page served from `static_dir` for everything else.
pub fn build_router(state: AppState, cors: CorsLayer, static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");
    let static_files = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    let api = Router::new().route(
        "/api/comments",
        get(comments::list_comments).post(comments::create_comment),
    );

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(errors::panic_response))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
