//! HTTP handlers for photo and video permalinks.

use crate::{errors::AppError, models::content_item::ContentType, state::AppState};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// GET `/photos/permalink/{*path}`
pub async fn photo_permalink(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    permalink(&state, ContentType::Photo, &path).await
}

/// GET `/videos/permalink/{*path}`
pub async fn video_permalink(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    permalink(&state, ContentType::Video, &path).await
}

/// GET `/photos/permalink` with no item - send the visitor back home.
pub async fn photo_permalink_root() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn permalink(state: &AppState, kind: ContentType, path: &str) -> Result<Response, AppError> {
    let permalink = state.content.permalink(kind, path).await?;
    Ok(Json(permalink).into_response())
}
