use std::convert::Infallible;
use std::time::Duration;

use super::{apply_policy, partition, Invoker};
use crate::config::AppConfig;
use crate::discovery::{self, CategoryDir};
use crate::error::Result;
use crate::extractor::{Extractor, Invocation, InvocationMode};
use crate::filter::FileFilter;
use crate::layout::OutputLayout;
use crate::scheduler::Pacer;

/// Counters for one full pass over every source/category pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub categories: usize,
    pub batches: usize,
    pub files: usize,
    pub failures: usize,
}

/// Continuous batch scan: sweep, wait, sweep again.
pub struct ContinuousRunner<'a, E, P> {
    config: &'a AppConfig,
    invoker: Invoker<E>,
    pacer: P,
    filter: FileFilter,
}

impl<'a, E: Extractor, P: Pacer> ContinuousRunner<'a, E, P> {
    pub fn new(config: &'a AppConfig, extractor: E, pacer: P) -> Result<Self> {
        let filter = FileFilter::with_pattern(&config.batch.pattern)?;
        Ok(Self {
            config,
            invoker: Invoker::new(extractor, config),
            pacer,
            filter,
        })
    }

    /// Sweeps until a fatal error occurs. Never returns `Ok`.
    pub fn run_forever(&self) -> Result<Infallible> {
        loop {
            self.run_sweep()?;
            self.wait_for_next_sweep();
        }
    }

    /// Runs `count` sweeps with the sweep pause between them.
    pub fn run_sweeps(&self, count: usize) -> Result<Vec<SweepSummary>> {
        let mut summaries = Vec::with_capacity(count);
        for idx in 0..count {
            summaries.push(self.run_sweep()?);
            if idx + 1 < count {
                self.wait_for_next_sweep();
            }
        }
        Ok(summaries)
    }

    /// One pass over every `source/category/pdfs` directory under the PDF root.
    pub fn run_sweep(&self) -> Result<SweepSummary> {
        let _span = tracing::info_span!("sweep").entered();
        let paths = &self.config.paths;
        let mut summary = SweepSummary::default();
        let categories = match discovery::category_dirs(&paths.pdf_root, &paths.pdf_dir_name) {
            Ok(categories) => categories,
            Err(err) => {
                tracing::warn!(error = %err, "PDF root unavailable; nothing to sweep");
                return Ok(summary);
            }
        };
        for dir in categories {
            self.process_category(&dir, &mut summary)?;
        }
        tracing::info!(
            categories = summary.categories,
            batches = summary.batches,
            files = summary.files,
            failures = summary.failures,
            "sweep complete"
        );
        Ok(summary)
    }

    fn process_category(&self, dir: &CategoryDir, summary: &mut SweepSummary) -> Result<()> {
        let _span =
            tracing::info_span!("category", source = %dir.source, category = %dir.category)
                .entered();
        let layout = OutputLayout::for_category(
            &self.config.paths.output_root,
            &dir.source,
            &dir.category,
            &self.config.layout,
        );
        layout.ensure()?;
        summary.categories += 1;

        let files = match discovery::list_pdfs(&dir.pdf_dir, &self.filter) {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(error = %err, "skipping category");
                return Ok(());
            }
        };
        let batch_pause = Duration::from_secs(self.config.batch.batch_pause_secs);
        for batch in partition(&files, self.config.batch.effective_batch_size()) {
            let invocation = Invocation {
                mode: InvocationMode::Batch,
                input: dir.pdf_dir.clone(),
                stats_file: layout.stats_file(self.pacer.now()),
                images_target: layout.images_target(InvocationMode::Batch),
                data_target: layout.data_target(InvocationMode::Batch),
            };
            tracing::info!(files = batch.len(), "processing batch");
            let outcome = self
                .invoker
                .invoke(&dir.source, &dir.category, batch.len(), &invocation)?;
            summary.batches += 1;
            summary.files += batch.len();
            if let Err(err) = outcome.into_result(&invocation) {
                summary.failures += 1;
                apply_policy(self.config.batch.failure_policy, err)?;
            }
            self.pacer.pause(batch_pause);
        }
        Ok(())
    }

    fn wait_for_next_sweep(&self) {
        tracing::info!(
            seconds = self.config.batch.sweep_pause_secs,
            "waiting for new files"
        );
        self.pacer
            .pause(Duration::from_secs(self.config.batch.sweep_pause_secs));
    }
}
