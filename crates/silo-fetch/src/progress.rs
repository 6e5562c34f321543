//! Observable fetch progress.

use std::io::{self, Write};

/// Sink for per-completion progress updates.
///
/// [`on_progress`](Self::on_progress) is called once after every task
/// completion; it must be cheap, non-blocking, and safe to call repeatedly
/// with the same counts.
pub trait ProgressSink: Send + Sync {
    /// Called after each task completion with the running totals.
    fn on_progress(&self, completed: usize, total: usize);

    /// Called once after the final task (or immediately for empty batches).
    fn finish(&self) {}
}

/// Discards all progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Writes `loading progress: N%` in place on the current terminal line,
/// terminated by a newline after the final task.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineProgress;

impl ProgressSink for InlineProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let pct = (100.0 * completed as f64 / total as f64).round();
        let mut err = io::stderr();
        let _ = write!(err, "\rloading progress: {pct}%");
        let _ = err.flush();
    }

    fn finish(&self) {
        let _ = writeln!(io::stderr());
    }
}
