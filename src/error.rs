//! Error kinds surfaced by the index and query layers.
//!
//! Each failure class is a distinct variant so callers can decide retry vs.
//! abort. Per-file extraction failures are not represented here: they are
//! recovered inside an indexing run (logged, file skipped) and never abort
//! it — see [`crate::extract::ExtractError`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The source folder (or another precondition of the run) is
    /// inaccessible. Fatal for that run only.
    #[error("source folder inaccessible: {}", .path.display())]
    Setup { path: PathBuf },

    /// The query was rejected before reaching the store.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The underlying store failed (disk full, permissions, corruption).
    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}
