//! Bounded parallel batch processing

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use crossbeam::channel;
use serde::Serialize;
use tracing::{error, info};

use crate::config::BatchSettings;
use crate::error::{Result, PadResizeError};
use crate::processing::{ItemFailure, ItemStage, ProcessedImage, ProcessingEngine, ProcessingItem};

pub mod progress;

pub use progress::*;

/// Runs one item to completion on a worker thread
pub trait ItemProcessor: Send + Sync {
    fn process(&self, item: &ProcessingItem) -> std::result::Result<ProcessedImage, ItemFailure>;
}

impl ItemProcessor for ProcessingEngine {
    fn process(&self, item: &ProcessingItem) -> std::result::Result<ProcessedImage, ItemFailure> {
        ProcessingEngine::process(self, item)
    }
}

/// Build the fixed set of worker threads batches run on
pub fn build_worker_pool(workers: usize) -> Result<rayon::ThreadPool> {
    if workers == 0 {
        return Err(PadResizeError::config("Worker count must be greater than 0"));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("padresize-worker-{}", index))
        .build()
        .map_err(|e| PadResizeError::system(format!("Failed to start worker pool: {}", e)))
}

/// Runs a batch of items on a fixed set of worker threads.
///
/// Items flow through a bounded job queue to the workers; every worker sends
/// one report per item back over a channel to a single collector, which logs
/// the outcome and updates the counters. Runners sharing a pool share its
/// threads, so concurrent batches never exceed the pool size.
pub struct BatchRunner {
    settings: BatchSettings,
    processor: Arc<dyn ItemProcessor>,
    pool: Arc<rayon::ThreadPool>,
    progress: Arc<ProgressTracker>,
}

impl BatchRunner {
    /// Create a runner with its own pool; fails on invalid settings before any thread is started
    pub fn new(settings: BatchSettings) -> Result<Self> {
        settings.validate()?;
        let pool = build_worker_pool(settings.workers)?;

        info!("Initializing batch runner with {} workers", settings.workers);
        Ok(Self::assemble(settings, Arc::new(pool)))
    }

    /// Create a runner on an existing pool
    pub fn with_pool(settings: BatchSettings, pool: Arc<rayon::ThreadPool>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::assemble(settings, pool))
    }

    fn assemble(settings: BatchSettings, pool: Arc<rayon::ThreadPool>) -> Self {
        Self {
            processor: Arc::new(ProcessingEngine::new(&settings)),
            settings,
            pool,
            progress: Arc::new(ProgressTracker::new()),
        }
    }

    /// Replace the per-item processing
    pub fn with_processor(mut self, processor: Arc<dyn ItemProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Tracker updated while `run` executes
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Process every item and return once all of them have finished.
    ///
    /// Per-item failures, panics included, are recorded in the result; only
    /// an empty item list is an error.
    pub fn run(&self, items: Vec<ProcessingItem>) -> Result<BatchResult> {
        if items.is_empty() {
            return Err(PadResizeError::config("No images to process"));
        }

        let start_time = Instant::now();
        let total = items.len();

        info!(
            "Starting batch of {} images: target {}, background {}, {} workers",
            total, self.settings.target, self.settings.background, self.pool.current_num_threads()
        );
        self.progress.start(total);

        let (job_tx, job_rx) = channel::bounded::<ProcessingItem>(self.settings.queue_capacity);
        let (report_tx, report_rx) = channel::unbounded::<ItemReport>();

        for _ in 0..self.settings.workers {
            let job_rx = job_rx.clone();
            let report_tx = report_tx.clone();
            let processor = Arc::clone(&self.processor);

            self.pool.spawn(move || {
                for item in job_rx.iter() {
                    let outcome = process_guarded(processor.as_ref(), &item);
                    let report = ItemReport { identifier: item.identifier, outcome };
                    if report_tx.send(report).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(report_tx);

        let mut result = BatchResult::with_capacity(total);

        std::thread::scope(|scope| {
            // Feeding blocks while the queue is full, so it gets its own thread
            scope.spawn(move || {
                for item in items {
                    if job_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            for report in report_rx.iter() {
                self.record(&mut result, report);
            }
        });

        result.elapsed = start_time.elapsed();
        self.progress.complete_batch();

        if result.total != total {
            return Err(PadResizeError::system(format!(
                "Worker pool stopped early: {} of {} items reported",
                result.total, total
            )));
        }

        Ok(result)
    }

    /// Run the batch on the blocking thread pool of the current tokio runtime
    pub async fn run_async(self, items: Vec<ProcessingItem>) -> Result<BatchResult> {
        tokio::task::spawn_blocking(move || self.run(items))
            .await
            .map_err(|e| PadResizeError::system(format!("Task join error: {}", e)))?
    }

    /// Log one finished item and fold it into the result
    fn record(&self, result: &mut BatchResult, report: ItemReport) {
        match &report.outcome {
            ItemOutcome::Written { output_path, .. } => {
                info!(item = %report.identifier, output = %output_path.display(), "Processed and saved");
            }
            ItemOutcome::Failed { stage, error } => {
                error!(item = %report.identifier, stage = %stage, error = %error, "Error processing image");
            }
        }

        self.progress.finish_item(&report.identifier, report.outcome.is_success());
        result.push(report);
    }
}

/// Process one item, turning a panic into a failed outcome
fn process_guarded(processor: &dyn ItemProcessor, item: &ProcessingItem) -> ItemOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| processor.process(item))) {
        Ok(result) => result.into(),
        Err(payload) => ItemOutcome::Failed {
            stage: ItemStage::Failed,
            error: format!("worker panicked: {}", panic_message(payload.as_ref())),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Terminal state of one item
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Written {
        output_path: PathBuf,
        source_width: u32,
        source_height: u32,
        bytes_written: u64,
    },
    Failed {
        /// Stage the error happened in; `Failed` when the worker panicked
        stage: ItemStage,
        error: String,
    },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Final stage reached: `Written` or `Failed`
    pub fn stage(&self) -> ItemStage {
        match self {
            Self::Written { .. } => ItemStage::Written,
            Self::Failed { .. } => ItemStage::Failed,
        }
    }
}

impl From<std::result::Result<ProcessedImage, ItemFailure>> for ItemOutcome {
    fn from(result: std::result::Result<ProcessedImage, ItemFailure>) -> Self {
        match result {
            Ok(processed) => Self::Written {
                output_path: processed.output_path,
                source_width: processed.source_width,
                source_height: processed.source_height,
                bytes_written: processed.bytes_written,
            },
            Err(failure) => Self::Failed {
                stage: failure.stage,
                error: failure.error.to_string(),
            },
        }
    }
}

/// Outcome of one item, attributed by its identifier
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub identifier: String,
    pub outcome: ItemOutcome,
}

/// Aggregate result of one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Reports in completion order
    pub items: Vec<ItemReport>,
    pub elapsed: Duration,
}

impl BatchResult {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    fn push(&mut self, report: ItemReport) {
        self.total += 1;
        if report.outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(report);
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Reports of the items that failed
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|report| !report.outcome.is_success())
    }

    /// Get throughput in images per second
    pub fn images_per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.succeeded as f64 / self.elapsed.as_secs_f64()
    }
}
