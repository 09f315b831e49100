//! Represents a photo or video addressed by type and relative path.

use crate::models::location::Location;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Kind of media item. Each kind has its own root under the raw tree.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Photo,
    Video,
}

impl ContentType {
    /// Directory under the raw root holding items of this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            ContentType::Photo => "photos",
            ContentType::Video => "videos",
        }
    }

    /// Public address prefix that permalinks of this kind live under.
    pub fn permalink_prefix(self) -> &'static str {
        match self {
            ContentType::Photo => "/photos/permalink",
            ContentType::Video => "/videos/permalink",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Photo => write!(f, "photo"),
            ContentType::Video => write!(f, "video"),
        }
    }
}

/// A single photo or video.
///
/// `src` is the addressable suffix under the type root, without a leading
/// separator.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub src: String,
}

/// A resolved item together with its capture metadata and neighbours.
#[derive(Serialize, Clone, Debug)]
pub struct Permalink {
    pub item: ContentItem,

    /// Capture time as reported by the metadata reader.
    pub timestamp: Option<DateTime<Utc>>,

    pub location: Location,

    /// Whether `location` is worth showing.
    pub has_location: bool,

    /// Public address of the previous sibling, if any.
    pub prev_link: Option<String>,

    /// Public address of the next sibling, if any.
    pub next_link: Option<String>,
}
