//! Progress reporting and cancellation.
//!
//! The executor calls the reporter after every plan item. This is the only
//! point where the presentation layer gets control back during a run, and
//! the point where a cancellation request is honoured.

use crate::file_collector::RunResult;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A snapshot taken after one plan item has been handled.
#[derive(Debug, Clone)]
pub struct Progress<'a> {
    /// Plan items handled so far, including skipped files and errors.
    pub processed: u64,
    /// Best guess at the number of items, when known.
    pub total_estimate: Option<u64>,
    /// The file just handled.
    pub current_file: &'a Path,
    pub elapsed: Duration,
    /// Remaining time extrapolated from the average so far.
    pub eta: Option<Duration>,
}

impl Progress<'_> {
    /// Percentage complete (0-100) when a total is known.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total_estimate?;
        if total == 0 {
            return Some(100);
        }
        Some(((self.processed.min(total) * 100) / total) as u8)
    }
}

/// Extrapolates the remaining time from the average time per item.
pub fn estimate_eta(elapsed: Duration, processed: u64, total: Option<u64>) -> Option<Duration> {
    let total = total?;
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed);
    let per_item = elapsed.as_secs_f64() / processed as f64;
    Some(Duration::from_secs_f64(per_item * remaining as f64))
}

/// Receives progress from a running collection.
///
/// All methods default to no-ops.
pub trait ProgressReporter {
    fn on_start(&self, _total_estimate: Option<u64>) {}
    fn on_progress(&self, _progress: &Progress<'_>) {}
    fn on_complete(&self, _result: &RunResult) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Shared flag for aborting a run between plan items.
///
/// Clones share state, so one clone can be handed to a signal handler while
/// the executor polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Already-copied files stay where they are.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
