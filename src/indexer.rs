//! The index builder.
//!
//! One run walks the configured folder, decides per file whether
//! re-extraction is needed, and upserts results into the document store.
//! Runs proceed Discovering -> Extracting -> Complete; the completion signal
//! fires exactly once whether the run succeeds or fails. Per-file extraction
//! failures are logged and skipped; only a setup or store failure ends the
//! run early. All upserts of a run share one transaction, so concurrent
//! queries see either the previous index state or the committed new one.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::EngineError;
use crate::extract::TextExtractor;
use crate::models::UpsertOutcome;
use crate::normalize::normalize;
use crate::progress::{IndexingProgress, ProgressSnapshot};
use crate::store::DocumentStore;

/// File extension of indexable documents, matched case-insensitively.
pub const DOC_EXTENSION: &str = "pdf";

/// Handle to a running (or finished) indexing run.
///
/// Holds the run's progress state for polling and a completion signal for
/// blocking. At most one run may be active per store; starting another
/// before this one completes is a caller bug.
pub struct IndexRun {
    progress: Arc<IndexingProgress>,
    done: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl IndexRun {
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    pub fn is_complete(&self) -> bool {
        *self.done.borrow()
    }

    /// Blocks until the run's completion signal has fired and the indexing
    /// task has fully exited. No timeout; runs always terminate.
    pub async fn wait(&mut self) {
        let _ = self.done.wait_for(|done| *done).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Starts an indexing run on a background task and returns its handle.
pub fn spawn(
    store: DocumentStore,
    config: Config,
    extractor: Arc<dyn TextExtractor>,
) -> IndexRun {
    let progress = IndexingProgress::new();
    let done = progress.subscribe();

    let task = {
        let progress = Arc::clone(&progress);
        tokio::spawn(async move {
            if let Err(e) = run(&store, &config, extractor.as_ref(), &progress).await {
                tracing::error!("indexing run failed: {e}");
                progress.set_status(format!("indexing failed: {e}"));
            }
            progress.complete();
        })
    };

    IndexRun {
        progress,
        done,
        task: Some(task),
    }
}

async fn run(
    store: &DocumentStore,
    config: &Config,
    extractor: &dyn TextExtractor,
    progress: &IndexingProgress,
) -> Result<(), EngineError> {
    progress.set_status(format!(
        "scanning {} for documents...",
        config.source.folder.display()
    ));

    let files = discover(config)?;
    progress.set_total(files.len() as u64);
    progress.set_status("updating index; existing entries remain searchable...");

    let mut tx = store.pool().begin().await?;
    let mut inserted = 0u64;
    let mut updated = 0u64;

    for path in &files {
        // Count attempts, not successes: the progress bar tracks how far
        // through the candidate list the run is.
        progress.advance();

        if config.is_excluded(path) {
            continue;
        }

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        let modified_at = modified_secs(&metadata);
        let path_str = path.display().to_string();

        let stored = DocumentStore::last_modified_in(&mut *tx, &path_str).await?;
        let stale = stored.map_or(true, |s| s < modified_at);
        if !stale {
            continue;
        }

        // Extraction is attempted only for new or stale files.
        let raw = match extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("extraction failed, skipping: {e}");
                continue;
            }
        };
        let content = normalize(&raw);
        if content.is_empty() {
            // Never overwrite a previously good row with nothing.
            continue;
        }

        match DocumentStore::upsert_if_stale_in(&mut *tx, &path_str, &content, modified_at).await? {
            UpsertOutcome::Inserted => inserted += 1,
            UpsertOutcome::Updated => updated += 1,
            UpsertOutcome::Skipped => {}
        }
    }

    tx.commit().await?;

    progress.set_status(format!(
        "index complete: {} files scanned, {} added, {} updated",
        files.len(),
        inserted,
        updated
    ));
    Ok(())
}

/// Enumerates candidate files under the source folder, sorted for
/// deterministic processing order.
fn discover(config: &Config) -> Result<Vec<PathBuf>, EngineError> {
    let folder = &config.source.folder;
    if !folder.is_dir() {
        return Err(EngineError::Setup {
            path: folder.clone(),
        });
    }

    let walker = if config.source.recurse_on_index {
        WalkDir::new(folder)
    } else {
        WalkDir::new(folder).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_doc = entry
            .path()
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case(DOC_EXTENSION));
        if is_doc {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn modified_secs(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, SourceConfig};
    use std::fs;

    fn test_config(folder: PathBuf, recurse: bool) -> Config {
        Config {
            source: SourceConfig {
                folder,
                exclude_patterns: Vec::new(),
                recurse_on_index: recurse,
            },
            index: IndexConfig {
                path: PathBuf::from("/unused/docdex.sqlite"),
            },
        }
    }

    #[test]
    fn discover_filters_by_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("a.pdf"), "x").unwrap();
        fs::write(tmp.path().join("b.PDF"), "x").unwrap();
        fs::write(tmp.path().join("c.txt"), "x").unwrap();

        let files = discover(&test_config(tmp.path().to_path_buf(), false)).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn discover_respects_recursion_flag() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("top.pdf"), "x").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/nested.pdf"), "x").unwrap();

        let flat = discover(&test_config(tmp.path().to_path_buf(), false)).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = discover(&test_config(tmp.path().to_path_buf(), true)).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn discover_missing_folder_is_setup_error() {
        let err = discover(&test_config(PathBuf::from("/no/such/folder"), false)).unwrap_err();
        assert!(matches!(err, EngineError::Setup { .. }));
    }
}
