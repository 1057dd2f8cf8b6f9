//! Output directory layout for a source/category pair.
//!
//! Every invocation writes into three directories derived from the output
//! root. They are created lazily and idempotently before the extractor runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::{LayoutSettings, LayoutStyle};
use crate::error::{FigbatchError, Result};
use crate::extractor::InvocationMode;

/// `strftime` format embedded in statistics file names.
pub const STATS_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Resolved statistics/images/data directories for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub statistics_dir: PathBuf,
    pub images_dir: PathBuf,
    pub data_dir: PathBuf,
    figure_prefix: String,
    data_prefix: String,
    stats_prefix: String,
    stats_extension: String,
}

impl OutputLayout {
    pub fn for_category(
        output_root: &Path,
        source: &str,
        category: &str,
        settings: &LayoutSettings,
    ) -> Self {
        let mut root = output_root.join(source).join(category);
        if settings.style == LayoutStyle::Nested {
            root = root.join(&settings.nested_segment);
        }
        Self {
            statistics_dir: root.join(&settings.statistics_dir),
            images_dir: root.join(&settings.images_dir),
            data_dir: root.join(&settings.data_dir),
            figure_prefix: settings.figure_prefix.clone(),
            data_prefix: settings.data_prefix.clone(),
            stats_prefix: settings.stats_prefix.clone(),
            stats_extension: settings.stats_extension.clone(),
        }
    }

    pub fn dirs(&self) -> [&Path; 3] {
        [&self.statistics_dir, &self.images_dir, &self.data_dir]
    }

    /// Creates the three directories and makes sure they are writable.
    pub fn ensure(&self) -> Result<()> {
        ensure_writable(&self.dirs())
    }

    /// `statistics/stats_{YYYY-MM-DD_HH-MM-SS}.json`
    pub fn stats_file(&self, at: DateTime<Local>) -> PathBuf {
        self.statistics_dir.join(format!(
            "{}{}.{}",
            self.stats_prefix,
            at.format(STATS_TIMESTAMP_FORMAT),
            self.stats_extension
        ))
    }

    /// Image destination: the directory itself for batches, a filename
    /// prefix inside it for single files.
    pub fn images_target(&self, mode: InvocationMode) -> PathBuf {
        if mode.is_per_file() {
            self.images_dir.join(&self.figure_prefix)
        } else {
            self.images_dir.clone()
        }
    }

    pub fn data_target(&self, mode: InvocationMode) -> PathBuf {
        if mode.is_per_file() {
            self.data_dir.join(&self.data_prefix)
        } else {
            self.data_dir.clone()
        }
    }
}

/// Ensures each path exists as a directory the owner can write to.
///
/// Existing directories are left alone unless the owner write bit is missing,
/// in which case owner read/write/execute bits are added on top of the
/// current mode. The first failure aborts with the offending path.
pub fn ensure_writable<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        ensure_one(path).map_err(|source| FigbatchError::DirectorySetup {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn ensure_one(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    let metadata = fs::metadata(path)?;
    if owner_writable(&metadata) {
        return Ok(());
    }
    tracing::info!(path = %path.display(), "adding owner permissions to output directory");
    grant_owner_access(path, metadata.permissions())
}

#[cfg(unix)]
fn owner_writable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn owner_writable(metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}

#[cfg(unix)]
fn grant_owner_access(path: &Path, mut permissions: fs::Permissions) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() | 0o700);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn grant_owner_access(path: &Path, mut permissions: fs::Permissions) -> io::Result<()> {
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}
