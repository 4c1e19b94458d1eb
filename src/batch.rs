//! Batch orchestration over a folder of frames.
//!
//! Each file is processed independently and its outcome is written to the
//! slot at its original index, whatever the completion order. Failures are
//! recorded per slot and never abort the batch; only an invalid
//! configuration is fatal, and it is rejected before any image is touched.
//!
//! In parallel mode a dedicated rayon pool of `workers` threads runs the
//! pure per-image pipeline while the calling thread collects completions
//! over a channel, writes slots and reports progress.

use crate::config::{Foveation, RetinaConfig};
use crate::image::ProcessedImage;
use crate::pipeline::{image_rng, Deadline, Retina};
use crate::trace::{trace_event, trace_span};
use crate::util::{RetinaError, RetinaResult};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execution options for a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOptions {
    /// Run images on a worker pool instead of the calling thread.
    pub parallel: bool,
    /// Worker count; clamped to the available cores.
    pub workers: usize,
    /// Optional time budget per image.
    pub timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            workers: available_workers(),
            timeout: None,
        }
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Receives batch progress; every method defaults to a no-op.
pub trait BatchObserver {
    /// Called after each finished image with the monotonically increasing count.
    fn progress(&mut self, _completed: usize, _total: usize) {}
    /// Called after each finished image with `elapsed / completed * remaining`.
    fn estimated_time_remaining(&mut self, _remaining: Duration) {}
    /// Called once when the batch ends.
    fn total_elapsed(&mut self, _elapsed: Duration) {}
}

impl BatchObserver for () {}

/// Outcome of one slot.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    Processed(ProcessedImage),
    Failed { file: PathBuf, error: RetinaError },
    /// The batch was cancelled before this image started.
    Cancelled,
}

impl FrameOutcome {
    /// Returns the image for processed slots.
    pub fn image(&self) -> Option<&ProcessedImage> {
        match self {
            Self::Processed(img) => Some(img),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Lifecycle of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    PartiallyFailed,
    Cancelled,
}

/// Slots in original file order plus timing.
#[derive(Clone, Debug)]
pub struct BatchResult {
    slots: Vec<FrameOutcome>,
    durations: Vec<Option<Duration>>,
    elapsed: Duration,
    state: BatchState,
}

impl BatchResult {
    /// Number of slots (equal to the number of input files).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the outcome at `index`.
    pub fn get(&self, index: usize) -> Option<&FrameOutcome> {
        self.slots.get(index)
    }

    pub fn outcomes(&self) -> &[FrameOutcome] {
        &self.slots
    }

    pub fn into_outcomes(self) -> Vec<FrameOutcome> {
        self.slots
    }

    /// Count of processed slots.
    pub fn succeeded(&self) -> usize {
        self.slots.iter().filter(|s| s.image().is_some()).count()
    }

    /// Count of failed slots.
    pub fn failed(&self) -> usize {
        self.slots.iter().filter(|s| s.is_failed()).count()
    }

    /// Count of slots skipped by cancellation.
    pub fn cancelled(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, FrameOutcome::Cancelled))
            .count()
    }

    /// Wall time spent on the image at `index`; `None` when it never ran.
    pub fn duration(&self, index: usize) -> Option<Duration> {
        self.durations.get(index).copied().flatten()
    }

    /// Wall time of the whole batch.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Terminal state of the batch.
    pub fn state(&self) -> BatchState {
        self.state
    }
}

/// Shared flag that stops a running batch from starting new images.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a retina configuration across many files.
pub struct BatchOrchestrator {
    retina: Retina,
    options: BatchOptions,
    cancel: CancelHandle,
    state: BatchState,
}

impl BatchOrchestrator {
    /// Validates the configuration and options up front.
    pub fn new(config: RetinaConfig, options: BatchOptions) -> RetinaResult<Self> {
        if options.workers == 0 {
            return Err(RetinaError::config("workers", "must be >= 1"));
        }
        let retina = Retina::new(config)?;
        Ok(Self {
            retina,
            options,
            cancel: CancelHandle::default(),
            state: BatchState::Idle,
        })
    }

    /// Handle that can cancel a running batch from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Processes `folder/file` for every entry of `files`.
    ///
    /// Under dynamic foveation image `i` uses file `i + 1` as its next frame.
    pub fn run<S: AsRef<Path>>(
        &mut self,
        folder: &Path,
        files: &[S],
        observer: &mut dyn BatchObserver,
    ) -> RetinaResult<BatchResult> {
        let paths: Vec<PathBuf> = files.iter().map(|f| folder.join(f)).collect();
        let total = paths.len();
        let workers = self.options.workers.clamp(1, available_workers());
        let parallel = self.options.parallel && workers > 1 && total > 1;
        let _span = trace_span!("batch_run", total = total, parallel = parallel).entered();

        self.state = BatchState::Running;
        let start = Instant::now();
        let mut slots: Vec<Option<FrameOutcome>> = (0..total).map(|_| None).collect();
        let mut durations: Vec<Option<Duration>> = vec![None; total];
        let mut completed = 0usize;
        let mut record = |index: usize, (outcome, took): (FrameOutcome, Duration)| {
            slots[index] = Some(outcome);
            durations[index] = Some(took);
            completed += 1;
            observer.progress(completed, total);
            let elapsed = start.elapsed();
            let remaining = (total - completed) as f64 / completed as f64;
            observer.estimated_time_remaining(elapsed.mul_f64(remaining));
        };

        let job = ImageJob {
            retina: &self.retina,
            paths: &paths,
            timeout: self.options.timeout,
        };

        if parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|err| RetinaError::Computation {
                    stage: "worker_pool",
                    reason: err.to_string(),
                })?;
            let cancel = &self.cancel;
            let (tx, rx) = mpsc::channel::<(usize, (FrameOutcome, Duration))>();
            std::thread::scope(|scope| {
                scope.spawn(move || {
                    pool.install(|| {
                        (0..total).into_par_iter().for_each_with(tx, |tx, index| {
                            if cancel.is_cancelled() {
                                return;
                            }
                            // The receiver outlives every sender inside this scope.
                            let _ = tx.send((index, job.run(index)));
                        });
                    });
                });
                for (index, done) in rx {
                    record(index, done);
                }
            });
        } else {
            for index in 0..total {
                if self.cancel.is_cancelled() {
                    break;
                }
                record(index, job.run(index));
            }
        }

        let elapsed = start.elapsed();
        observer.total_elapsed(elapsed);
        let slots: Vec<FrameOutcome> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(FrameOutcome::Cancelled))
            .collect();

        let result = BatchResult {
            state: terminal_state(&slots),
            slots,
            durations,
            elapsed,
        };
        self.state = result.state;
        trace_event!(
            "batch_summary",
            succeeded = result.succeeded(),
            failed = result.failed(),
            cancelled = result.cancelled(),
            elapsed_ms = elapsed.as_millis() as u64
        );
        Ok(result)
    }
}

fn terminal_state(slots: &[FrameOutcome]) -> BatchState {
    if slots.iter().any(|s| matches!(s, FrameOutcome::Cancelled)) {
        BatchState::Cancelled
    } else if slots.iter().any(FrameOutcome::is_failed) {
        BatchState::PartiallyFailed
    } else {
        BatchState::Completed
    }
}

#[derive(Clone, Copy)]
struct ImageJob<'a> {
    retina: &'a Retina,
    paths: &'a [PathBuf],
    timeout: Option<Duration>,
}

impl ImageJob<'_> {
    fn run(&self, index: usize) -> (FrameOutcome, Duration) {
        let started = Instant::now();
        let path = &self.paths[index];
        let next = match self.retina.config().foveation {
            Foveation::Dynamic { .. } => self.paths.get(index + 1).map(PathBuf::as_path),
            Foveation::Static => None,
        };
        let deadline = self.timeout.map(Deadline::after);
        let mut rng = image_rng(self.retina.config().seed, index as u64);

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.retina
                .apply_with(path, next, &mut rng, deadline.as_ref())
        }))
        .unwrap_or_else(|_| {
            Err(RetinaError::Computation {
                stage: "pipeline",
                reason: "panicked".to_string(),
            })
        });

        let outcome = match result {
            Ok(out) => FrameOutcome::Processed(out.image),
            Err(error) => {
                trace_event!(
                    warn: "image_failed",
                    index = index,
                    path = path.display().to_string().as_str(),
                    error = error.to_string().as_str()
                );
                FrameOutcome::Failed {
                    file: path.clone(),
                    error,
                }
            }
        };
        (outcome, started.elapsed())
    }
}

/// Validates `config` and runs one batch with a fresh orchestrator.
pub fn run_batch<S: AsRef<Path>>(
    config: RetinaConfig,
    folder: &Path,
    files: &[S],
    options: BatchOptions,
    observer: &mut dyn BatchObserver,
) -> RetinaResult<BatchResult> {
    BatchOrchestrator::new(config, options)?.run(folder, files, observer)
}
