//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the entries dir and the raw media root

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tokio::fs;

/// `GET /healthz`
///
/// Very small liveness probe - always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that confirms both backing directories are still there
/// and readable. The corpus itself was loaded at startup, so only its size
/// is reported.
///
/// Returns HTTP 200 when all checks pass, HTTP 503 when any check fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let entries_check = check_dir(&state.config.entries_dir).await;
    let media_check = check_dir(&state.content.raw_root).await;
    let overall_ok = entries_check.ok && media_check.ok;

    let mut checks = HashMap::new();
    checks.insert("entries_dir", entries_check);
    checks.insert("raw_root", media_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        entries: state.corpus.len(),
        cached_variants: state.resizer.cached_variants(),
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Best-effort: the path must be a directory we can open for listing.
async fn check_dir(path: &Path) -> CheckStatus {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => match fs::read_dir(path).await {
            Ok(_) => CheckStatus {
                ok: true,
                error: None,
            },
            Err(e) => CheckStatus {
                ok: false,
                error: Some(format!("could not list {}: {}", path.display(), e)),
            },
        },
        Ok(_) => CheckStatus {
            ok: false,
            error: Some(format!("{} is not a directory", path.display())),
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("error: {}", e)),
        },
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    entries: usize,
    cached_variants: usize,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
