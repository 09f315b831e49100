//! src/services/resize_service.rs
//!
//! ResizeService - produces resized variants of source images on demand and
//! memoizes them per (source, dimension, mode, source mtime). Concurrent
//! requests for the same variant share one decode/resize: the first caller
//! runs it and everyone else awaits the same cell.

use crate::services::content_service::is_missing;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader, imageops::FilterType};
use serde::Deserialize;
use std::{
    collections::{HashMap, VecDeque},
    io::{self, Cursor},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};
use thiserror::Error;
use tokio::{fs, sync::OnceCell};
use tracing::{debug, error};

/// How the requested dimension constrains the output.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Longer edge becomes the target.
    #[default]
    Expand,
    /// Shorter edge becomes the target.
    Fill,
    Width,
    Height,
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("source image `{}` not found", .0.display())]
    SourceNotFound(PathBuf),
    #[error("dimension {0} is out of range")]
    InvalidDimension(u32),
    #[error("cannot decode `{}`: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot encode resized image: {0}")]
    Encode(#[source] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("resize task failed: {0}")]
    Task(String),
}

pub type ResizeResult<T> = Result<T, ResizeError>;

/// An encoded, resized image ready to be sent.
#[derive(Debug)]
pub struct DerivedAsset {
    pub bytes: Bytes,
    pub content_type: &'static str,
    /// Hex MD5 of `bytes`.
    pub etag: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    dimension: u32,
    mode: ResizeMode,
    modified: SystemTime,
}

impl CacheKey {
    fn same_variant(&self, other: &CacheKey) -> bool {
        self.path == other.path && self.dimension == other.dimension && self.mode == other.mode
    }
}

type AssetCell = Arc<OnceCell<Arc<DerivedAsset>>>;

#[derive(Default)]
struct CacheInner {
    cells: HashMap<CacheKey, AssetCell>,
    /// Insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

/// Bounded map of once-cells, one per variant.
struct AssetCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl AssetCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Get or create the cell for `key`.
    ///
    /// Creating a cell drops cells for older mtimes of the same variant and
    /// evicts the oldest cells beyond capacity. Evicted cells that are still
    /// being computed finish for whoever already holds them.
    fn cell(&self, key: &CacheKey) -> AssetCell {
        if self.capacity == 0 {
            return Arc::new(OnceCell::new());
        }

        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cell) = guard.cells.get(key) {
            return Arc::clone(cell);
        }

        let CacheInner { cells, order } = &mut *guard;
        cells.retain(|k, _| !k.same_variant(key));
        order.retain(|k| cells.contains_key(k));
        while cells.len() >= self.capacity {
            match order.pop_front() {
                Some(oldest) => {
                    cells.remove(&oldest);
                }
                None => break,
            }
        }

        let cell: AssetCell = Arc::new(OnceCell::new());
        cells.insert(key.clone(), Arc::clone(&cell));
        order.push_back(key.clone());
        cell
    }

    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cells
            .len()
    }
}

#[derive(Clone)]
pub struct ResizeService {
    max_dimension: u32,
    cache: Arc<AssetCache>,
}

impl ResizeService {
    pub fn new(max_dimension: u32, cache_entries: usize) -> Self {
        Self {
            max_dimension,
            cache: Arc::new(AssetCache::new(cache_entries)),
        }
    }

    /// Number of variants currently held (including ones still rendering).
    pub fn cached_variants(&self) -> usize {
        self.cache.len()
    }

    /// Resize `source` so that `dimension` constrains it as `mode` says.
    ///
    /// Identical requests against an unchanged source reuse the first result.
    /// Failures are not cached; the next request tries again.
    pub async fn resize(
        &self,
        source: &Path,
        dimension: u32,
        mode: ResizeMode,
    ) -> ResizeResult<Arc<DerivedAsset>> {
        if dimension == 0 || dimension > self.max_dimension {
            return Err(ResizeError::InvalidDimension(dimension));
        }

        let meta = match fs::metadata(source).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(ResizeError::SourceNotFound(source.to_path_buf())),
            Err(err) if is_missing(&err) => {
                return Err(ResizeError::SourceNotFound(source.to_path_buf()));
            }
            Err(err) => return Err(ResizeError::Io(err)),
        };

        let key = CacheKey {
            path: source.to_path_buf(),
            dimension,
            mode,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        };
        let cell = self.cache.cell(&key);
        if cell.initialized() {
            debug!("resize cache hit for {} @ {}", source.display(), dimension);
        }

        let result = cell
            .get_or_try_init(|| async {
                let path = key.path.clone();
                let limit = self.max_dimension;
                tokio::task::spawn_blocking(move || render(&path, dimension, mode, limit))
                    .await
                    .map_err(|err| ResizeError::Task(err.to_string()))?
                    .map(Arc::new)
            })
            .await;

        match result {
            Ok(asset) => Ok(Arc::clone(asset)),
            Err(err) => {
                error!("resizing {} failed: {}", source.display(), err);
                Err(err)
            }
        }
    }
}

/// Output size for a `width`×`height` source under `mode`.
///
/// Aspect ratio is preserved; each edge is rounded and kept at least 1px.
/// Neither edge exceeds `limit`, whatever the mode asks for.
pub fn target_dimensions(
    width: u32,
    height: u32,
    target: u32,
    mode: ResizeMode,
    limit: u32,
) -> (u32, u32) {
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
    let target = f64::from(target);
    let scale = match mode {
        ResizeMode::Expand => target / w.max(h),
        ResizeMode::Fill => target / w.min(h),
        ResizeMode::Width => target / w,
        ResizeMode::Height => target / h,
    };
    let scale = scale.min(f64::from(limit.max(1)) / w.max(h));
    let edge = |v: f64| ((v * scale).round() as u32).max(1);
    (edge(w), edge(h))
}

/// Decode, resize, and re-encode one image. Runs on a blocking thread.
fn render(path: &Path, dimension: u32, mode: ResizeMode, limit: u32) -> ResizeResult<DerivedAsset> {
    let reader = ImageReader::open(path)
        .map_err(|err| {
            if is_missing(&err) {
                ResizeError::SourceNotFound(path.to_path_buf())
            } else {
                ResizeError::Io(err)
            }
        })?
        .with_guessed_format()?;
    let source_format = reader.format();
    let img = reader.decode().map_err(|source| ResizeError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = target_dimensions(img.width(), img.height(), dimension, mode, limit);
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let format = match source_format {
        Some(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP)) => format,
        _ => ImageFormat::Jpeg,
    };
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        ImageFormat::WebP => DynamicImage::ImageRgba8(resized.to_rgba8()),
        _ => resized,
    };

    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, format)
        .map_err(ResizeError::Encode)?;
    let bytes = Bytes::from(buf.into_inner());
    let etag = format!("{:x}", md5::compute(&bytes));

    debug!(
        "rendered {} at {}x{} ({} bytes)",
        path.display(),
        width,
        height,
        bytes.len()
    );
    Ok(DerivedAsset {
        bytes,
        content_type: content_type(format),
        etag,
        width,
        height,
    })
}

fn content_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        _ => "image/jpeg",
    }
}
