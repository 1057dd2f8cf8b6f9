//! Configuration record for a figbatch deployment.
//!
//! Stored as TOML. The file is located, in order of precedence, at:
//!   an explicit `--config` path,
//!   the `FIGBATCH_CONFIG` environment variable,
//!   `<os config dir>/figbatch/config.toml` (via `directories::ProjectDirs`).
//!
//! A missing file yields [`AppConfig::default`]. The record is built once at
//! startup and handed by reference to every component; nothing reads it from
//! ambient state afterwards.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Standard file name for the config inside the resolved config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "FIGBATCH_CONFIG";

/// Root configuration for both orchestration modes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Input and output roots.
    #[serde(default)]
    pub paths: PathSettings,
    /// Continuous batch-scan knobs (batch size, pacing, failure policy).
    #[serde(default)]
    pub batch: BatchSettings,
    /// One-shot per-file scan filters.
    #[serde(default)]
    pub scan: ScanSettings,
    /// Output directory naming.
    #[serde(default)]
    pub layout: LayoutSettings,
    /// How the external extraction tool is invoked.
    #[serde(default)]
    pub extractor: ExtractorSettings,
    /// Optional JSONL audit trail of invocations.
    #[serde(default)]
    pub events: EventSettings,
}

/// What to do when a single extractor invocation exits non-zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run and exit non-zero.
    Abort,
    /// Log the failure and move on to the next unit of work.
    Continue,
}

/// Shape of the per-category output tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStyle {
    /// `{output}/{source}/{category}/{statistics,images,data}`
    Flat,
    /// `{output}/{source}/{category}/output/{statistics,images,data}`
    Nested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root holding `{source}/{category}/pdfs/*.pdf`.
    #[serde(default = "default_pdf_root")]
    pub pdf_root: PathBuf,
    /// Root receiving `{source}/{category}/...` outputs.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Name of the leaf directory that holds a category's PDFs.
    #[serde(default = "default_pdf_dir_name")]
    pub pdf_dir_name: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            pdf_root: default_pdf_root(),
            output_root: default_output_root(),
            pdf_dir_name: default_pdf_dir_name(),
        }
    }
}

fn default_pdf_root() -> PathBuf {
    PathBuf::from("data/pdfs")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_pdf_dir_name() -> String {
    "pdfs".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Number of PDFs per extractor invocation.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between consecutive batches, in seconds.
    #[serde(default = "default_batch_pause_secs")]
    pub batch_pause_secs: u64,
    /// Pause between full sweeps, in seconds.
    #[serde(default = "default_sweep_pause_secs")]
    pub sweep_pause_secs: u64,
    /// Filename glob applied to the `pdfs` directory listing.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_batch_failure_policy")]
    pub failure_policy: FailurePolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_secs: default_batch_pause_secs(),
            sweep_pause_secs: default_sweep_pause_secs(),
            pattern: default_pattern(),
            failure_policy: default_batch_failure_policy(),
        }
    }
}

impl BatchSettings {
    /// Batch size clamped to at least one file.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

const fn default_batch_size() -> usize {
    100
}

const fn default_batch_pause_secs() -> u64 {
    5
}

const fn default_sweep_pause_secs() -> u64 {
    60
}

const fn default_batch_failure_policy() -> FailurePolicy {
    FailurePolicy::Abort
}

fn default_pattern() -> String {
    "*.pdf".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Only files modified strictly after this instant (RFC 3339 or `YYYY-MM-DD`).
    #[serde(default)]
    pub modified_after: Option<String>,
    /// Only files modified strictly before this instant.
    #[serde(default)]
    pub modified_before: Option<String>,
    /// Restrict to one source; empty matches every source.
    #[serde(default)]
    pub source: String,
    /// Restrict to one category; empty matches every category.
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_scan_failure_policy")]
    pub failure_policy: FailurePolicy,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            modified_after: None,
            modified_before: None,
            source: String::new(),
            category: String::new(),
            failure_policy: default_scan_failure_policy(),
        }
    }
}

const fn default_scan_failure_policy() -> FailurePolicy {
    FailurePolicy::Continue
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default = "default_layout_style")]
    pub style: LayoutStyle,
    #[serde(default = "default_statistics_dir")]
    pub statistics_dir: String,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Extra segment inserted under the category for [`LayoutStyle::Nested`].
    #[serde(default = "default_nested_segment")]
    pub nested_segment: String,
    /// Filename prefix for figure images in per-file mode.
    #[serde(default = "default_figure_prefix")]
    pub figure_prefix: String,
    /// Filename prefix for figure data in per-file mode.
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,
    #[serde(default = "default_stats_prefix")]
    pub stats_prefix: String,
    #[serde(default = "default_stats_extension")]
    pub stats_extension: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            style: default_layout_style(),
            statistics_dir: default_statistics_dir(),
            images_dir: default_images_dir(),
            data_dir: default_data_dir(),
            nested_segment: default_nested_segment(),
            figure_prefix: default_figure_prefix(),
            data_prefix: default_data_prefix(),
            stats_prefix: default_stats_prefix(),
            stats_extension: default_stats_extension(),
        }
    }
}

const fn default_layout_style() -> LayoutStyle {
    LayoutStyle::Flat
}

fn default_statistics_dir() -> String {
    "statistics".into()
}

fn default_images_dir() -> String {
    "images".into()
}

fn default_data_dir() -> String {
    "data".into()
}

fn default_nested_segment() -> String {
    "output".into()
}

fn default_figure_prefix() -> String {
    "figure".into()
}

fn default_data_prefix() -> String {
    "data".into()
}

fn default_stats_prefix() -> String {
    "stats_".into()
}

fn default_stats_extension() -> String {
    "json".into()
}

/// Command line contract of the external figure extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the entry point (JVM options for sbt).
    #[serde(default = "default_leading_args")]
    pub leading_args: Vec<String>,
    /// When non-empty, the entry point and the input/output arguments are
    /// joined into a single argument (sbt `runMain` style). An empty string
    /// passes them as separate arguments.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default = "default_stats_flag")]
    pub stats_flag: String,
    #[serde(default = "default_images_flag")]
    pub images_flag: String,
    #[serde(default = "default_data_flag")]
    pub data_flag: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            leading_args: default_leading_args(),
            entry_point: default_entry_point(),
            stats_flag: default_stats_flag(),
            images_flag: default_images_flag(),
            data_flag: default_data_flag(),
        }
    }
}

fn default_program() -> String {
    "sbt".into()
}

fn default_leading_args() -> Vec<String> {
    vec!["-J-Xmx8g".into()]
}

fn default_entry_point() -> String {
    "runMain org.allenai.pdffigures2.FigureExtractorBatchCli".into()
}

fn default_stats_flag() -> String {
    "-s".into()
}

fn default_images_flag() -> String {
    "-m".into()
}

fn default_data_flag() -> String {
    "-d".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventSettings {
    /// JSONL file receiving one record per extractor invocation.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

/// Resolves the config file path.
///
/// Order of precedence:
/// 1. `explicit` (the `--config` flag).
/// 2. `FIGBATCH_CONFIG` environment variable.
/// 3. OS-specific config directory via `directories::ProjectDirs`.
pub fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let dirs = ProjectDirs::from("", "", "figbatch")
        .context("Unable to determine OS config directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Loads the configuration at `path`, or defaults when the file is absent.
pub fn load_or_default(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: AppConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    } else {
        Ok(AppConfig::default())
    }
}

/// Persists the configuration to `path`, creating parent directories.
pub fn save(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = toml::to_string_pretty(config)?;
    fs::write(path, data)?;
    Ok(())
}
