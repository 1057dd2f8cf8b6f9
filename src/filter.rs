//! Pure predicates deciding which files and which source/category pairs are
//! processed.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use glob::{MatchOptions, Pattern};

use crate::config::ScanSettings;
use crate::error::{FigbatchError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Filename glob plus optional modification-time bounds.
///
/// Both bounds are exclusive. An absent pattern matches every name.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pattern: Option<Pattern>,
    modified_after: Option<DateTime<Utc>>,
    modified_before: Option<DateTime<Utc>>,
}

impl FileFilter {
    pub fn new(
        pattern: Option<&str>,
        modified_after: Option<DateTime<Utc>>,
        modified_before: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let pattern = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => Some(Pattern::new(raw).map_err(|source| {
                FigbatchError::InvalidPattern {
                    pattern: raw.to_string(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(Self {
            pattern,
            modified_after,
            modified_before,
        })
    }

    /// Pattern-only filter, as used by the batch sweep.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Self::new(Some(pattern), None, None)
    }

    /// Builds the one-shot scan filter from its config section.
    pub fn from_scan(settings: &ScanSettings) -> Result<Self> {
        let after = settings
            .modified_after
            .as_deref()
            .map(parse_date_bound)
            .transpose()?;
        let before = settings
            .modified_before
            .as_deref()
            .map(parse_date_bound)
            .transpose()?;
        Self::new(Some(&settings.pattern), after, before)
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |p| p.matches_with(file_name, MATCH_OPTIONS))
    }

    pub fn matches_modified(&self, modified: DateTime<Utc>) -> bool {
        if let Some(after) = self.modified_after {
            if modified <= after {
                return false;
            }
        }
        if let Some(before) = self.modified_before {
            if modified >= before {
                return false;
            }
        }
        true
    }

    pub fn has_time_bounds(&self) -> bool {
        self.modified_after.is_some() || self.modified_before.is_some()
    }

    /// Checks the base name and, when bounds are set, the file's mtime.
    ///
    /// A file whose metadata cannot be read (removed mid-scan, permission
    /// denied) does not match. Names that are not UTF-8 only fail when a
    /// pattern is set.
    pub fn matches(&self, path: &Path) -> bool {
        if self.pattern.is_some() {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            if !self.matches_name(name) {
                return false;
            }
        }
        if !self.has_time_bounds() {
            return true;
        }
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => self.matches_modified(DateTime::<Utc>::from(modified)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unable to read modification time");
                false
            }
        }
    }
}

/// Parses a date bound given either as RFC 3339 or as a bare `YYYY-MM-DD`
/// (local midnight).
pub fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| FigbatchError::InvalidDate(raw.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| FigbatchError::InvalidDate(raw.to_string()))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| FigbatchError::InvalidDate(raw.to_string()))
}

/// Empty targets match any value; non-empty targets require equality.
pub fn should_process(
    source: &str,
    category: &str,
    target_source: &str,
    target_category: &str,
) -> bool {
    (target_source.is_empty() || source == target_source)
        && (target_category.is_empty() || category == target_category)
}

/// Source/category restriction taken from the scan settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub source: String,
    pub category: String,
}

impl Scope {
    pub fn from_scan(settings: &ScanSettings) -> Self {
        Self {
            source: settings.source.clone(),
            category: settings.category.clone(),
        }
    }

    pub fn includes(&self, source: &str, category: &str) -> bool {
        should_process(source, category, &self.source, &self.category)
    }
}
