use std::process::Command;
use std::time::Instant;

use super::{CommandLine, Extractor, Invocation, InvocationOutcome};
use crate::config::ExtractorSettings;
use crate::error::{FigbatchError, Result};

/// Runs the configured program as a child process and waits for it.
///
/// No timeout is applied: a hung extractor blocks the caller.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    settings: ExtractorSettings,
}

impl ProcessExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    pub fn command_line(&self, invocation: &Invocation) -> CommandLine {
        CommandLine::build(&self.settings, invocation)
    }
}

impl Extractor for ProcessExtractor {
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutcome> {
        let line = self.command_line(invocation);
        tracing::debug!(command = %line.display(), "launching extractor");
        let started = Instant::now();
        let output = Command::new(&line.program)
            .args(&line.args)
            .output()
            .map_err(|source| FigbatchError::Spawn {
                program: line.program.clone(),
                source,
            })?;
        let outcome = InvocationOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            input = %invocation.input.display(),
            status = %outcome.status_label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout = %outcome.stdout.trim(),
            "extractor finished"
        );
        Ok(outcome)
    }
}
