use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub entries_dir: PathBuf,
    pub raw_root: PathBuf,
    pub page_size: usize,
    pub default_resize: u32,
    pub max_resize: u32,
    pub resize_cache_entries: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Blog and photo/video archive server")]
pub struct Args {
    /// Host to bind to (overrides ARCHIVE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ARCHIVE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory of blog entry files (overrides ARCHIVE_ENTRIES_DIR)
    #[arg(long)]
    pub entries_dir: Option<PathBuf>,

    /// Root of the raw photo/video tree (overrides ARCHIVE_RAW_ROOT)
    #[arg(long)]
    pub raw_root: Option<PathBuf>,

    /// Entries per blog index page (overrides ARCHIVE_PAGE_SIZE)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Resize target when a request gives none (overrides ARCHIVE_DEFAULT_RESIZE)
    #[arg(long)]
    pub default_resize: Option<u32>,

    /// Largest resize target accepted (overrides ARCHIVE_MAX_RESIZE)
    #[arg(long)]
    pub max_resize: Option<u32>,

    /// Resized variants kept in memory, 0 disables caching (overrides ARCHIVE_RESIZE_CACHE_ENTRIES)
    #[arg(long)]
    pub resize_cache_entries: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |key| env::var(key))
    }

    /// CLI values win over environment values, which win over defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|_| default.into());

        let cfg = Self {
            host: args
                .host
                .unwrap_or_else(|| string("ARCHIVE_HOST", "0.0.0.0")),
            port: args
                .port
                .map(Ok)
                .unwrap_or_else(|| parse_var(&lookup, "ARCHIVE_PORT", 3000))?,
            entries_dir: args
                .entries_dir
                .unwrap_or_else(|| string("ARCHIVE_ENTRIES_DIR", "./templates/blog/entries").into()),
            raw_root: args
                .raw_root
                .unwrap_or_else(|| string("ARCHIVE_RAW_ROOT", "./raw").into()),
            page_size: args
                .page_size
                .map(Ok)
                .unwrap_or_else(|| parse_var(&lookup, "ARCHIVE_PAGE_SIZE", 3))?,
            default_resize: args
                .default_resize
                .map(Ok)
                .unwrap_or_else(|| parse_var(&lookup, "ARCHIVE_DEFAULT_RESIZE", 1200))?,
            max_resize: args
                .max_resize
                .map(Ok)
                .unwrap_or_else(|| parse_var(&lookup, "ARCHIVE_MAX_RESIZE", 4096))?,
            resize_cache_entries: args
                .resize_cache_entries
                .map(Ok)
                .unwrap_or_else(|| parse_var(&lookup, "ARCHIVE_RESIZE_CACHE_ENTRIES", 256))?,
        };

        if cfg.page_size == 0 {
            anyhow::bail!("page size must be at least 1");
        }
        if cfg.default_resize == 0 || cfg.default_resize > cfg.max_resize {
            anyhow::bail!(
                "default resize {} must be between 1 and max resize {}",
                cfg.default_resize,
                cfg.max_resize
            );
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read and parse a numeric env var, falling back to `default` when unset.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
