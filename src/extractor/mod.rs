//! Invocation contract of the external figure extractor.
//!
//! The extractor is a black box: it receives one input (a directory of PDFs
//! or a single PDF) and three destinations, and reports success through its
//! exit status. [`Extractor`] is the seam the orchestration loop calls; the
//! production implementation is [`ProcessExtractor`].

pub mod process;

pub use process::ProcessExtractor;

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ExtractorSettings;
use crate::error::{FigbatchError, Result};

/// Whether an invocation covers a whole `pdfs` directory or one file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    Batch,
    File,
}

impl InvocationMode {
    pub fn is_per_file(self) -> bool {
        matches!(self, InvocationMode::File)
    }
}

/// Inputs and destinations for one extractor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: InvocationMode,
    pub input: PathBuf,
    pub stats_file: PathBuf,
    pub images_target: PathBuf,
    pub data_target: PathBuf,
}

/// Exit status and captured output of a finished extractor process.
#[derive(Debug, Clone, Default)]
pub struct InvocationOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".into(),
        }
    }

    /// Converts a non-zero exit into [`FigbatchError::InvocationFailed`].
    pub fn into_result(self, invocation: &Invocation) -> Result<Self> {
        if self.succeeded() {
            return Ok(self);
        }
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            self.stderr.trim().to_string()
        };
        Err(FigbatchError::InvocationFailed {
            input: invocation.input.clone(),
            status: self.status_label(),
            stderr: detail,
        })
    }
}

/// Runs the extractor for a single invocation, blocking until it exits.
///
/// `Err` is reserved for failing to start the program at all; a process that
/// ran and exited non-zero is reported through the returned outcome.
pub trait Extractor {
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutcome>;
}

impl<T: Extractor + ?Sized> Extractor for &T {
    fn run(&self, invocation: &Invocation) -> Result<InvocationOutcome> {
        (**self).run(invocation)
    }
}

/// Program plus explicit argument vector; never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn build(settings: &ExtractorSettings, invocation: &Invocation) -> Self {
        let mut args: Vec<OsString> = settings.leading_args.iter().map(OsString::from).collect();
        let tail: Vec<OsString> = vec![
            invocation.input.clone().into_os_string(),
            settings.stats_flag.clone().into(),
            invocation.stats_file.clone().into_os_string(),
            settings.images_flag.clone().into(),
            invocation.images_target.clone().into_os_string(),
            settings.data_flag.clone().into(),
            invocation.data_target.clone().into_os_string(),
        ];
        let entry_point = settings.entry_point.trim();
        if entry_point.is_empty() {
            args.extend(tail);
        } else {
            // sbt takes the whole `runMain` command as one argument and
            // splits it on whitespace itself.
            let mut joined = entry_point.to_string();
            for part in &tail {
                joined.push(' ');
                joined.push_str(&quote_arg(&part.to_string_lossy()));
            }
            args.push(joined.into());
        }
        Self {
            program: settings.program.clone(),
            args,
        }
    }

    /// Human-readable rendering for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote_arg(&arg.to_string_lossy()));
        }
        line
    }
}

/// Double-quotes `arg` when it contains whitespace or quotes, escaping
/// embedded quotes and backslashes.
fn quote_arg(arg: &str) -> String {
    if !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
