//! The text-extraction collaborator.
//!
//! The indexer invokes an extractor once per stale or new file. A failure is
//! logged and treated as "no content available" for that file; it never
//! fails the run. Whatever the extractor returns is passed through
//! [`crate::normalize::normalize`] before it reaches the store.

use std::path::{Path, PathBuf};

/// Extraction failure for a single file. Recovered locally by the indexer.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: PathBuf, message: String },
}

/// Extracts plain text from one document file.
///
/// Implementations must be cheap to share across the indexing task; the
/// engine holds them behind an `Arc`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// PDF extraction via `pdf-extract`.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
