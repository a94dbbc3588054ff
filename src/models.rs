//! Core data types shared across the index and query layers.

/// A document row as persisted in the index store.
///
/// One record per absolute file path. `content` is normalized text (see
/// [`crate::normalize`]); rows for files that have since been deleted persist
/// until manually purged.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub path: String,
    pub content: String,
    /// Source file modification time, epoch seconds.
    pub last_modified: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What `upsert_if_stale` did with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The stored row was at least as new as the file; nothing changed.
    Skipped,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: String,
    pub file_name: String,
    /// Bounded excerpt of content around the match.
    pub context: String,
    /// Formatted `YYYY-MM-DD HH:MM:SS`, local time.
    pub last_modified: String,
}
