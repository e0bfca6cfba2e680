//! State of one batch session

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use coastview_algorithms::exposure::ExposureResult;
use crate::checkpoint::Checkpoint;

/// Counters, timings and the checkpoint of a running session.
///
/// Owned by the caller and passed to the driver explicitly; nothing about a
/// session lives in global state.
#[derive(Debug)]
pub struct Session {
    checkpoint: Checkpoint,
    cancel: Arc<AtomicBool>,
    started: Instant,
    processed: usize,
    exposed: usize,
    unavailable: usize,
    skipped: usize,
    row_times: Vec<Duration>,
}

impl Session {
    pub fn new(checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint,
            cancel: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
            processed: 0,
            exposed: 0,
            unavailable: 0,
            skipped: 0,
            row_times: Vec::new(),
        }
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn checkpoint_mut(&mut self) -> &mut Checkpoint {
        &mut self.checkpoint
    }

    /// Shared flag that stops the session at the next point boundary
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Points processed in this session
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub(crate) fn record(&mut self, result: &ExposureResult, elapsed: Duration) {
        self.processed += 1;
        match result.exposure() {
            Some(e) if e.exposed_at_all_overall => self.exposed += 1,
            Some(_) => {}
            None => self.unavailable += 1,
        }
        self.row_times.push(elapsed);
    }

    pub(crate) fn record_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    pub fn summary(&self) -> SessionSummary {
        let mean_row_time = (!self.row_times.is_empty()).then(|| {
            self.row_times.iter().sum::<Duration>() / self.row_times.len() as u32
        });
        SessionSummary {
            processed: self.processed,
            exposed: self.exposed,
            unavailable: self.unavailable,
            skipped: self.skipped,
            cancelled: self.is_cancelled(),
            mean_row_time,
            elapsed: self.started.elapsed(),
        }
    }
}

/// End-of-session report
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub processed: usize,
    pub exposed: usize,
    pub unavailable: usize,
    /// Points in range that were already checkpointed
    pub skipped: usize,
    pub cancelled: bool,
    pub mean_row_time: Option<Duration>,
    pub elapsed: Duration,
}

impl SessionSummary {
    /// Nothing left to do for this identifier range
    pub fn is_finished(&self) -> bool {
        self.processed == 0 && !self.cancelled
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed: {} points", self.processed)?;
        writeln!(f, "  Exposed: {}", self.exposed)?;
        writeln!(f, "  Unavailable: {}", self.unavailable)?;
        writeln!(f, "  Already done: {}", self.skipped)?;
        if let Some(mean) = self.mean_row_time {
            writeln!(f, "  Mean time per point: {:.2?}", mean)?;
        }
        write!(f, "  Total time: {:.2?}", self.elapsed)
    }
}
