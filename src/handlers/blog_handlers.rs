//! HTTP handlers for the blog: the paginated index and single entries.
//! Both hand back the full entry list too, for the sidebar.

use crate::{
    errors::AppError,
    models::entry::Entry,
    services::corpus_service::parse_skip,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Query params accepted by the blog index.
///
/// `skip` stays a string so that garbage falls back to 0 instead of
/// rejecting the request.
#[derive(Debug, Deserialize)]
pub struct BlogIndexQuery {
    pub skip: Option<String>,
}

/// An entry plus its display-formatted date.
#[derive(Serialize)]
struct EntryView<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    display_date: String,
}

impl<'a> From<&'a Entry> for EntryView<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            entry,
            display_date: entry.display_date(),
        }
    }
}

#[derive(Serialize)]
struct BlogIndexResponse<'a> {
    entries: Vec<EntryView<'a>>,
    page: Vec<EntryView<'a>>,
    next_skip: usize,
}

#[derive(Serialize)]
struct BlogEntryResponse<'a> {
    entries: Vec<EntryView<'a>>,
    entry: EntryView<'a>,
}

/// GET `/` and `/blog` - one page of entries, newest first.
pub async fn blog_index(
    State(state): State<AppState>,
    Query(q): Query<BlogIndexQuery>,
) -> Response {
    let skip = parse_skip(q.skip.as_deref());
    let page_size = state.config.page_size;
    let corpus = &state.corpus;

    Json(BlogIndexResponse {
        entries: corpus.all().iter().map(EntryView::from).collect(),
        page: corpus.window(skip, page_size).iter().map(EntryView::from).collect(),
        next_skip: skip.saturating_add(page_size),
    })
    .into_response()
}

/// GET `/blog/{*path}` - a single entry by identifier.
pub async fn blog_entry(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let id = path.strip_prefix('/').unwrap_or(&path);
    let corpus = &state.corpus;
    let entry = corpus
        .lookup(id)
        .ok_or_else(|| AppError::not_found(format!("no such entry `{}`", id)))?;

    Ok(Json(BlogEntryResponse {
        entries: corpus.all().iter().map(EntryView::from).collect(),
        entry: entry.into(),
    })
    .into_response())
}
