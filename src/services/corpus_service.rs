//! src/services/corpus_service.rs
//!
//! Corpus loading and the newest-first temporal index over blog entries.
//! The corpus is read once at startup and never mutated afterwards, so the
//! resulting `Corpus` is shared behind an `Arc` without any locking.

use crate::models::entry::Entry;
use chrono::NaiveDate;
use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

/// Only files with this extension are treated as entries.
const ENTRY_EXTENSION: &str = "html";
/// Length of the `MM-DD-YY` date prefix.
const DATE_PREFIX_LEN: usize = 8;
const DATE_FORMAT: &str = "%m-%d-%y";

/// Failure that prevents the corpus from loading at all.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot list entries directory `{}`: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a single file was left out of the corpus.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("file name too short to carry a date prefix")]
    NameTooShort,
    #[error("date prefix is not followed by a delimiter")]
    MissingDelimiter,
    #[error("invalid date prefix `{prefix}`: {source}")]
    BadDate {
        prefix: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unreadable: {0}")]
    Unreadable(#[from] io::Error),
    #[error("identifier `{0}` already loaded")]
    DuplicateId(String),
}

/// A file that was skipped during load, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of scanning an entries directory.
///
/// Per-file failures never abort the load; they are collected in `skipped`
/// for the caller to log or inspect.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub entries: Vec<Entry>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    /// Sort the loaded entries and build the lookup index.
    pub fn into_corpus(self) -> Corpus {
        Corpus::from_entries(self.entries)
    }
}

/// Scan `dir` for entry files and parse each of them.
///
/// Files are visited in lexicographic name order so that entries sharing a
/// date keep a deterministic relative order after sorting. Only a failure to
/// list the directory itself is an error.
pub fn load_corpus(dir: &Path) -> Result<LoadReport, CorpusError> {
    let list_err = |source| CorpusError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for dirent in fs::read_dir(dir).map_err(list_err)? {
        let path = dirent.map_err(list_err)?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    for path in paths {
        match parse_entry_file(&path) {
            Ok(entry) if seen.contains(&entry.id) => {
                let reason = SkipReason::DuplicateId(entry.id);
                report.skipped.push(SkippedFile { path, reason });
            }
            Ok(entry) => {
                debug!("loaded entry {} ({})", entry.id, entry.date);
                seen.insert(entry.id.clone());
                report.entries.push(entry);
            }
            Err(reason) => report.skipped.push(SkippedFile { path, reason }),
        }
    }

    info!(
        "loaded {} entries from {} ({} skipped)",
        report.entries.len(),
        dir.display(),
        report.skipped.len()
    );
    Ok(report)
}

/// Parse a single entry file into an `Entry`.
fn parse_entry_file(path: &Path) -> Result<Entry, SkipReason> {
    let base = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(SkipReason::NameTooShort)?;
    let (id, date) = parse_entry_name(base)?;

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let (title, body) = split_title(&content);

    Ok(Entry {
        id,
        date,
        title: title.to_string(),
        body: body.to_string(),
    })
}

/// Extract the identifier and publication date from a file's base name.
fn parse_entry_name(base: &str) -> Result<(String, NaiveDate), SkipReason> {
    if base.len() <= DATE_PREFIX_LEN || !base.is_char_boundary(DATE_PREFIX_LEN) {
        return Err(SkipReason::NameTooShort);
    }
    let (prefix, rest) = base.split_at(DATE_PREFIX_LEN);
    if !rest.starts_with(['-', '_', '.', ' ']) {
        return Err(SkipReason::MissingDelimiter);
    }

    let date =
        NaiveDate::parse_from_str(prefix, DATE_FORMAT).map_err(|source| SkipReason::BadDate {
            prefix: prefix.to_string(),
            source,
        })?;

    let id = base.split('.').next().unwrap_or(base).to_string();
    Ok((id, date))
}

/// First line is the title; everything after the first `\n` is the body.
fn split_title(content: &str) -> (&str, &str) {
    match content.split_once('\n') {
        Some((title, body)) => (title.trim_end_matches('\r'), body),
        None => (content, ""),
    }
}

/// Interpret a raw `skip` query value. Missing, negative, or unparsable
/// input all mean "start at the beginning".
pub fn parse_skip(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|skip| usize::try_from(skip).unwrap_or(0))
        .unwrap_or(0)
}

/// All entries, newest first, plus lookup by identifier.
#[derive(Debug, Default)]
pub struct Corpus {
    entries: Vec<Entry>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus from entries in load order.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut corpus = Self {
            entries,
            by_id: HashMap::new(),
        };
        corpus.sort();
        corpus
    }

    /// Order entries by descending date and rebuild the id index.
    ///
    /// `sort_by` is stable, so same-day entries keep their load order.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));
        self.by_id = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.id.clone(), pos))
            .collect();
    }

    /// Every entry in display order.
    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `limit` entries starting at offset `skip`. Empty when `skip`
    /// runs past the end.
    pub fn window(&self, skip: usize, limit: usize) -> &[Entry] {
        let start = skip.min(self.entries.len());
        let end = start.saturating_add(limit).min(self.entries.len());
        &self.entries[start..end]
    }

    /// Exact-match lookup by identifier.
    pub fn lookup(&self, id: &str) -> Option<&Entry> {
        self.by_id.get(id).map(|&pos| &self.entries[pos])
    }
}
