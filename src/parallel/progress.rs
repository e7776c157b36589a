//! Progress tracking for batch runs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Progress of the current batch.
///
/// Only the runner's collecting thread records outcomes; any number of
/// observers may read the state or subscribe to updates.
pub struct ProgressTracker {
    sender: broadcast::Sender<ProgressUpdate>,
    start_time: Mutex<Option<Instant>>,
    total: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Snapshot of the current progress
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Progress update event
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Started {
        total: usize,
    },
    ItemFinished {
        identifier: String,
        success: bool,
        finished: usize,
        total: usize,
    },
    BatchCompleted {
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    },
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);

        Self {
            sender,
            start_time: Mutex::new(None),
            total: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Start tracking progress for a batch
    pub fn start(&self, total: usize) {
        *self.start_time.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());

        self.total.store(total, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);

        let _ = self.sender.send(ProgressUpdate::Started { total });

        debug!("Started progress tracking for {} items", total);
    }

    /// Record a finished item
    pub fn finish_item(&self, identifier: &str, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let state = self.state();
        let _ = self.sender.send(ProgressUpdate::ItemFinished {
            identifier: identifier.to_string(),
            success,
            finished: state.finished(),
            total: state.total,
        });
    }

    /// Mark batch as completed
    pub fn complete_batch(&self) {
        let state = self.state();

        let _ = self.sender.send(ProgressUpdate::BatchCompleted {
            succeeded: state.succeeded,
            failed: state.failed,
            elapsed: state.elapsed,
        });

        info!(
            "Batch completed: {}/{} items successful in {:.2}s",
            state.succeeded,
            state.total,
            state.elapsed.as_secs_f64()
        );
    }

    /// Get current progress state
    pub fn state(&self) -> ProgressState {
        let elapsed = self
            .start_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|start| start.elapsed())
            .unwrap_or_default();

        ProgressState {
            total: self.total.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed,
        }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.finished() as f64 / self.total as f64) * 100.0
    }

    /// Get human-readable completion status
    pub fn status_text(&self) -> String {
        if self.total > 0 && self.finished() >= self.total {
            "Completed".to_string()
        } else {
            format!("{}/{} images processed", self.finished(), self.total)
        }
    }
}
