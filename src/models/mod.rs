//! Core data models for the media archive.
//!
//! Blog entries are loaded once from flat files; content items are resolved
//! per request against the raw media tree. Everything here serializes as
//! JSON via `serde` so handlers can hand it straight to the client.

pub mod content_item;
pub mod entry;
pub mod location;
