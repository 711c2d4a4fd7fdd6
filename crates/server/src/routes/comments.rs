use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use models::Comment;
use serde::Deserialize;

use super::AppState;
use crate::errors::JsonApiError;

#[derive(Debug, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub text: Option<String>,
}

/// All comments, newest first.
pub async fn list_comments(State(state): State<AppState>) -> Json<Vec<Comment>> {
    Json(state.comments.list().await)
}

pub async fn create_comment(
    State(state): State<AppState>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), JsonApiError> {
    let Json(input) = payload.map_err(|rejection| JsonApiError::bad_request(rejection.body_text()))?;
    let text = input.text.unwrap_or_default();
    let created = state.comments.submit(&text).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
