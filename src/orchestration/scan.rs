use super::{apply_policy, Invoker};
use crate::config::AppConfig;
use crate::discovery::{self, DiscoveredFile};
use crate::error::Result;
use crate::extractor::{Extractor, Invocation, InvocationMode};
use crate::filter::{FileFilter, Scope};
use crate::layout::OutputLayout;
use crate::scheduler::Pacer;

/// Counters for a one-shot scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files seen by the walk at category depth.
    pub considered: usize,
    /// Files inside the scope that passed the name/date filter.
    pub matched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One-shot scoped scan invoking the extractor once per qualifying file.
pub struct ScanRunner<'a, E, P> {
    config: &'a AppConfig,
    invoker: Invoker<E>,
    pacer: P,
    filter: FileFilter,
    scope: Scope,
}

impl<'a, E: Extractor, P: Pacer> ScanRunner<'a, E, P> {
    pub fn new(config: &'a AppConfig, extractor: E, pacer: P) -> Result<Self> {
        Ok(Self {
            config,
            invoker: Invoker::new(extractor, config),
            pacer,
            filter: FileFilter::from_scan(&config.scan)?,
            scope: Scope::from_scan(&config.scan),
        })
    }

    pub fn run(&self) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        for file in discovery::walk_files(&self.config.paths.pdf_root) {
            summary.considered += 1;
            if !self.scope.includes(&file.source, &file.category) || !self.filter.matches(&file.path)
            {
                continue;
            }
            summary.matched += 1;
            self.process_file(&file, &mut summary)?;
        }
        tracing::info!(
            considered = summary.considered,
            matched = summary.matched,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "scan complete"
        );
        Ok(summary)
    }

    fn process_file(&self, file: &DiscoveredFile, summary: &mut ScanSummary) -> Result<()> {
        let layout = OutputLayout::for_category(
            &self.config.paths.output_root,
            &file.source,
            &file.category,
            &self.config.layout,
        );
        layout.ensure()?;
        let invocation = Invocation {
            mode: InvocationMode::File,
            input: file.path.clone(),
            stats_file: layout.stats_file(self.pacer.now()),
            images_target: layout.images_target(InvocationMode::File),
            data_target: layout.data_target(InvocationMode::File),
        };
        tracing::info!(
            source = %file.source,
            category = %file.category,
            file = %file.path.display(),
            "processing file"
        );
        let outcome = self
            .invoker
            .invoke(&file.source, &file.category, 1, &invocation)?;
        match outcome.into_result(&invocation) {
            Ok(_) => summary.succeeded += 1,
            Err(err) => {
                summary.failed += 1;
                apply_policy(self.config.scan.failure_policy, err)?;
            }
        }
        Ok(())
    }
}
