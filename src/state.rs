//! Shared state handed to every handler.
//!
//! The corpus is built once before serving starts and only read afterwards;
//! the services are cheap to clone and share their internals through `Arc`.

use crate::{
    config::AppConfig,
    services::{
        content_service::ContentService, corpus_service::Corpus, resize_service::ResizeService,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Blog entries, newest first.
    pub corpus: Arc<Corpus>,
    /// Photo/video resolution and navigation.
    pub content: ContentService,
    /// On-demand resized photos.
    pub resizer: ResizeService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, corpus: Corpus) -> Self {
        let content = ContentService::new(config.raw_root.clone());
        let resizer = ResizeService::new(config.max_resize, config.resize_cache_entries);
        Self {
            corpus: Arc::new(corpus),
            content,
            resizer,
            config: Arc::new(config),
        }
    }
}
