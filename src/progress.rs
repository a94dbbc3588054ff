//! Indexing progress observation.
//!
//! One [`IndexingProgress`] exists per indexing run. The indexing task
//! mutates it; any number of observers poll [`IndexingProgress::snapshot`]
//! (the CLI does so once per second) or block on the run handle's
//! [`wait`](crate::indexer::IndexRun::wait). The completion signal is set
//! exactly once per run and never reset; a fresh run gets fresh state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub struct IndexingProgress {
    total: AtomicU64,
    current: AtomicU64,
    status: Mutex<String>,
    done: watch::Sender<bool>,
}

/// A point-in-time copy of the run state.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub current: u64,
    pub status: String,
    pub complete: bool,
}

impl IndexingProgress {
    pub fn new() -> Arc<Self> {
        let (done, _) = watch::channel(false);
        Arc::new(Self {
            total: AtomicU64::new(0),
            current: AtomicU64::new(0),
            status: Mutex::new("preparing index run...".to_string()),
            done,
        })
    }

    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Increments the processed-file counter. Called before each file is
    /// handled, so `current` counts attempts, not successes.
    pub fn advance(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_status(&self, status: impl Into<String>) {
        *self.status.lock().unwrap() = status.into();
    }

    /// Fires the completion signal. Called once, as the last act of a run.
    pub fn complete(&self) {
        let _ = self.done.send_replace(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.done.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::Relaxed),
            current: self.current.load(Ordering::Relaxed),
            status: self.status.lock().unwrap().clone(),
            complete: *self.done.subscribe().borrow(),
        }
    }
}
