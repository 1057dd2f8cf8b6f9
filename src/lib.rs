//! Batch orchestration around an external PDF figure extractor.
//!
//! Walks `{pdf_root}/{source}/{category}/pdfs`, decides which PDFs qualify,
//! prepares `{output_root}/{source}/{category}/{statistics,images,data}` and
//! shells out to the extractor, either once per file (one-shot scan) or once
//! per fixed-size batch in an endless sweep loop.

pub mod config;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod layout;
pub mod orchestration;
pub mod scheduler;

// Re-export commonly used types for convenience.
pub use config::{AppConfig, FailurePolicy, LayoutStyle};
pub use error::FigbatchError;
pub use extractor::{Extractor, Invocation, InvocationMode, InvocationOutcome, ProcessExtractor};
pub use orchestration::{ContinuousRunner, ScanRunner, ScanSummary, SweepSummary};
pub use scheduler::{Pacer, SystemPacer};
