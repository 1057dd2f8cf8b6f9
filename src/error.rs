use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the orchestration components.
///
/// Traversal races are not represented here: the discovery layer logs and
/// skips them instead of returning an error.
#[derive(Debug, Error)]
pub enum FigbatchError {
    #[error("unable to prepare output directory {}: {source}", path.display())]
    DirectorySetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch extractor `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("extractor failed on {} ({status}): {stderr}", input.display())]
    InvocationFailed {
        input: PathBuf,
        status: String,
        stderr: String,
    },
    #[error("unable to list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid date bound '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid filename pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

pub type Result<T> = std::result::Result<T, FigbatchError>;
