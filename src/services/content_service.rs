//! src/services/content_service.rs
//!
//! ContentService - resolves photos and videos under the raw media tree and
//! derives previous/next permalinks from the item's directory siblings.
//! Nothing here mutates shared state; every call works on request-local data
//! plus read-only filesystem queries.

use crate::models::{
    content_item::{ContentItem, ContentType, Permalink},
    location::Location,
};
use chrono::{DateTime, Utc};
use std::{
    fmt, io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no such {kind} `{src}`")]
    NotFound { kind: ContentType, src: String },
    #[error("invalid content path `{0}`")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ContentResult<T> = Result<T, ContentError>;

/// Capture metadata read from a media file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureMetadata {
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Location,
}

/// Source of capture time and geolocation for a media file.
pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> CaptureMetadata;
}

/// Reports the file modification time as capture time and no location.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsMetadataReader;

impl MetadataReader for FsMetadataReader {
    fn read(&self, path: &Path) -> CaptureMetadata {
        let timestamp = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .ok();
        CaptureMetadata {
            timestamp,
            location: Location::Unknown,
        }
    }
}

/// A content item found on disk, with the storage path it was found at.
#[derive(Clone, Debug)]
pub struct ResolvedItem {
    pub item: ContentItem,
    pub storage_path: PathBuf,
}

/// Previous/next public addresses around an item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavLinks {
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Clone)]
pub struct ContentService {
    /// Root of the raw tree; each `ContentType` has a subdirectory here.
    pub raw_root: PathBuf,

    metadata: Arc<dyn MetadataReader>,
}

impl fmt::Debug for ContentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentService")
            .field("raw_root", &self.raw_root)
            .finish_non_exhaustive()
    }
}

impl ContentService {
    pub fn new(raw_root: impl Into<PathBuf>) -> Self {
        Self::with_metadata_reader(raw_root, Arc::new(FsMetadataReader))
    }

    pub fn with_metadata_reader(
        raw_root: impl Into<PathBuf>,
        metadata: Arc<dyn MetadataReader>,
    ) -> Self {
        Self {
            raw_root: raw_root.into(),
            metadata,
        }
    }

    /// Directory holding every item of `kind`.
    pub fn type_root(&self, kind: ContentType) -> PathBuf {
        self.raw_root.join(kind.dir_name())
    }

    /// Validate a captured path and map it to its location on disk.
    ///
    /// A single leading `/` is dropped and the rest is cleaned: empty and `.`
    /// segments go away, so `trip//a.jpg` and `./trip/a.jpg` name the same
    /// item as `trip/a.jpg`. Anything that could step outside the type root
    /// (`..`, absolute components, backslashes, NUL) is rejected.
    pub fn storage_path(&self, kind: ContentType, raw_path: &str) -> ContentResult<(String, PathBuf)> {
        let invalid = || ContentError::InvalidPath(raw_path.to_string());
        let trimmed = raw_path.strip_prefix('/').unwrap_or(raw_path);
        if trimmed.contains(['\\', '\0']) {
            return Err(invalid());
        }

        let mut segments = Vec::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_string_lossy()),
                Component::CurDir => {}
                _ => return Err(invalid()),
            }
        }
        if segments.is_empty() {
            return Err(invalid());
        }

        let src = segments.join("/");
        let storage_path = self.type_root(kind).join(&src);
        Ok((src, storage_path))
    }

    /// Locate an item on disk. Missing files and invalid paths are NotFound.
    pub async fn resolve(&self, kind: ContentType, raw_path: &str) -> ContentResult<ResolvedItem> {
        let not_found = || ContentError::NotFound {
            kind,
            src: raw_path.trim_start_matches('/').to_string(),
        };
        let (src, storage_path) = match self.storage_path(kind, raw_path) {
            Ok(resolved) => resolved,
            Err(ContentError::InvalidPath(_)) => return Err(not_found()),
            Err(err) => return Err(err),
        };

        match fs::metadata(&storage_path).await {
            Ok(meta) if meta.is_file() => Ok(ResolvedItem {
                item: ContentItem { kind, src },
                storage_path,
            }),
            Ok(_) => Err(not_found()),
            Err(err) if is_missing(&err) => Err(not_found()),
            Err(err) => Err(ContentError::Io(err)),
        }
    }

    /// Every entry in the item's parent directory, sorted by path.
    ///
    /// The sorted listing is the navigation order; it is not re-sorted by
    /// capture time.
    pub async fn siblings(&self, storage_path: &Path) -> io::Result<Vec<String>> {
        let parent = storage_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "item has no parent directory"))?;

        let mut listing = Vec::new();
        let mut dir = fs::read_dir(parent).await?;
        while let Some(dirent) = dir.next_entry().await? {
            listing.push(parent.join(dirent.file_name()).to_string_lossy().into_owned());
        }
        listing.sort();
        Ok(listing)
    }

    /// Turn a storage path into the public permalink address for `kind`.
    pub fn public_address(&self, kind: ContentType, storage_path: &str) -> String {
        let root = self.type_root(kind);
        rewrite_prefix(
            storage_path,
            &root.to_string_lossy(),
            kind.permalink_prefix(),
        )
    }

    /// Compute previous/next links for `item` within `siblings`.
    pub fn build_links(&self, resolved: &ResolvedItem, siblings: &[String]) -> NavLinks {
        let item_path = resolved.storage_path.to_string_lossy();
        let Some(index) = siblings.iter().position(|s| *s == item_path) else {
            warn!("{} missing from its own directory listing", item_path);
            return NavLinks::default();
        };
        debug!("found {} at index {}", item_path, index);

        let (prev, next) = neighbours(siblings, index);
        let kind = resolved.item.kind;
        NavLinks {
            prev: prev.map(|p| self.public_address(kind, p)),
            next: next.map(|n| self.public_address(kind, n)),
        }
    }

    /// Resolve an item and gather everything its permalink page shows.
    ///
    /// A failure to list siblings only drops the navigation links.
    pub async fn permalink(&self, kind: ContentType, raw_path: &str) -> ContentResult<Permalink> {
        let resolved = self.resolve(kind, raw_path).await?;
        let listing = self.siblings(&resolved.storage_path).await;
        Ok(self.assemble(resolved, listing))
    }

    fn assemble(&self, resolved: ResolvedItem, listing: io::Result<Vec<String>>) -> Permalink {
        let links = match listing {
            Ok(siblings) => self.build_links(&resolved, &siblings),
            Err(err) => {
                warn!(
                    "listing siblings of {} failed: {}",
                    resolved.storage_path.display(),
                    err
                );
                NavLinks::default()
            }
        };

        let meta = self.metadata.read(&resolved.storage_path);
        Permalink {
            item: resolved.item,
            timestamp: meta.timestamp,
            location: meta.location,
            has_location: meta.location.is_valid(),
            prev_link: links.prev,
            next_link: links.next,
        }
    }
}

/// Stat failures that mean "nothing there", including a path that runs
/// through a regular file.
pub fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Entries on either side of `index`, if any.
fn neighbours(siblings: &[String], index: usize) -> (Option<&str>, Option<&str>) {
    let prev = index
        .checked_sub(1)
        .and_then(|i| siblings.get(i))
        .map(String::as_str);
    let next = siblings.get(index + 1).map(String::as_str);
    (prev, next)
}

/// Replace a leading `storage_root` with `public_prefix`, once.
///
/// Paths that do not start with the root come back unchanged so the broken
/// link is visible rather than silently pointing somewhere else.
fn rewrite_prefix(path: &str, storage_root: &str, public_prefix: &str) -> String {
    match path.strip_prefix(storage_root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{}", public_prefix, rest)
        }
        _ => {
            warn!("{} is not under {}; leaving link unrewritten", path, storage_root);
            path.to_string()
        }
    }
}
