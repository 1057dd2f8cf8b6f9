//! Drives scan -> filter -> batch -> invoke.
//!
//! Two modes share the same components:
//! * [`ContinuousRunner`] sweeps every `source/category/pdfs` directory,
//!   invokes the extractor once per fixed-size batch and repeats forever.
//! * [`ScanRunner`] walks the tree once and invokes the extractor per file.
//!
//! Everything runs on the calling thread; an invocation blocks until the
//! extractor exits.

pub mod events;
pub mod scan;
pub mod sweep;

pub use events::{InvocationRecord, RunLog};
pub use scan::{ScanRunner, ScanSummary};
pub use sweep::{ContinuousRunner, SweepSummary};

use chrono::Utc;

use crate::config::{AppConfig, FailurePolicy};
use crate::error::{FigbatchError, Result};
use crate::extractor::{Extractor, Invocation, InvocationOutcome};

/// Splits `items` into consecutive slices of at most `batch_size` (minimum 1).
pub fn partition<T>(items: &[T], batch_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(batch_size.max(1))
}

/// Runs the extractor and appends the audit record when a log is configured.
struct Invoker<E> {
    extractor: E,
    log: Option<RunLog>,
}

impl<E: Extractor> Invoker<E> {
    fn new(extractor: E, config: &AppConfig) -> Self {
        Self {
            extractor,
            log: config.events.log_path.clone().map(RunLog::new),
        }
    }

    fn invoke(
        &self,
        source: &str,
        category: &str,
        file_count: usize,
        invocation: &Invocation,
    ) -> Result<InvocationOutcome> {
        let started_at = Utc::now();
        let outcome = self.extractor.run(invocation)?;
        if let Some(log) = &self.log {
            let record =
                InvocationRecord::new(source, category, file_count, invocation, &outcome, started_at);
            if let Err(err) = log.append(&record) {
                tracing::warn!(path = %log.path().display(), error = %err, "unable to append invocation record");
            }
        }
        Ok(outcome)
    }
}

/// Applies `policy` to a failed invocation: `Abort` hands the error back,
/// `Continue` logs it and swallows it.
fn apply_policy(policy: FailurePolicy, err: FigbatchError) -> Result<()> {
    match policy {
        FailurePolicy::Abort => {
            tracing::error!(error = %err, "extraction failed; aborting run");
            Err(err)
        }
        FailurePolicy::Continue => {
            tracing::error!(error = %err, "extraction failed; continuing with next item");
            Ok(())
        }
    }
}
