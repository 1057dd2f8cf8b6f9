use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractor::{Invocation, InvocationMode, InvocationOutcome};

/// One extractor execution, appended to the JSONL audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub record_id: Uuid,
    pub mode: InvocationMode,
    pub source: String,
    pub category: String,
    pub input: PathBuf,
    pub stats_file: PathBuf,
    pub file_count: usize,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl InvocationRecord {
    pub fn new(
        source: &str,
        category: &str,
        file_count: usize,
        invocation: &Invocation,
        outcome: &InvocationOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            mode: invocation.mode,
            source: source.to_string(),
            category: category.to_string(),
            input: invocation.input.clone(),
            stats_file: invocation.stats_file.clone(),
            file_count,
            exit_code: outcome.exit_code,
            success: outcome.succeeded(),
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Append-only JSONL file of [`InvocationRecord`]s.
///
/// Write-only from the orchestrator's point of view: nothing in a sweep
/// reads it back.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &InvocationRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(serde_json::to_string(record)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    pub fn load(&self) -> io::Result<Vec<InvocationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            let record: InvocationRecord = serde_json::from_str(line)?;
            records.push(record);
        }
        Ok(records)
    }
}
