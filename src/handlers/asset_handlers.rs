//! On-the-fly resized photos.

use crate::{
    errors::AppError,
    models::content_item::ContentType,
    services::resize_service::{DerivedAsset, ResizeMode},
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Deserialize;
use tracing::debug;

const CACHE_CONTROL: &str = "public, max-age=86400";

/// Query params accepted by the resize endpoint.
#[derive(Debug, Deserialize)]
pub struct ResizeQuery {
    pub size: Option<u32>,
    pub mode: Option<ResizeMode>,
}

/// GET `/assets/photos/{*path}?size=&mode=` - a resized copy of a photo.
pub async fn resized_photo(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(q): Query<ResizeQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let size = q.size.unwrap_or(state.config.default_resize);
    let mode = q.mode.unwrap_or_default();

    let (_, source) = state.content.storage_path(ContentType::Photo, &path)?;
    let asset = state.resizer.resize(&source, size, mode).await?;
    debug!(
        "serving {} at {}x{} ({:?})",
        source.display(),
        asset.width,
        asset.height,
        mode
    );

    let etag = format!("\"{}\"", asset.etag);
    if etag_matches(&headers, &etag) {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        set_asset_headers(response.headers_mut(), &asset, &etag);
        return Ok(response);
    }

    let mut response = Response::new(Body::from(asset.bytes.clone()));
    *response.status_mut() = StatusCode::OK;
    set_asset_headers(response.headers_mut(), &asset, &etag);
    response.headers_mut().insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(asset.bytes.len()),
    );
    Ok(response)
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == etag || candidate == "*")
        })
}

fn set_asset_headers(headers: &mut HeaderMap, asset: &DerivedAsset, etag: &str) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(asset.content_type),
    );
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL),
    );
}
