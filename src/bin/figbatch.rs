use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use figbatch::config::{self, AppConfig, FailurePolicy, LayoutStyle};
use figbatch::orchestration::RunLog;
use figbatch::{ContinuousRunner, ProcessExtractor, ScanRunner, SystemPacer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "figbatch")]
#[command(about = "Runs a figure extractor over a source/category tree of PDFs")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $FIGBATCH_CONFIG, then the OS config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep every category in batches, forever (or --sweeps times).
    Watch(WatchArgs),
    /// Walk the tree once and run the extractor per matching file.
    Scan(ScanArgs),
    /// Write the effective configuration to the config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the most recent invocation records from the event log.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args)]
struct PathArgs {
    /// Root holding {source}/{category}/pdfs.
    #[arg(long)]
    pdf_root: Option<PathBuf>,
    /// Root receiving {source}/{category}/{statistics,images,data}.
    #[arg(long)]
    output_root: Option<PathBuf>,
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    paths: PathArgs,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    pattern: Option<String>,
    #[arg(long)]
    batch_pause_secs: Option<u64>,
    #[arg(long)]
    sweep_pause_secs: Option<u64>,
    #[arg(long, value_enum)]
    on_failure: Option<PolicyArg>,
    /// Stop after this many sweeps instead of running forever.
    #[arg(long)]
    sweeps: Option<usize>,
}

#[derive(Args)]
struct ScanArgs {
    #[command(flatten)]
    paths: PathArgs,
    #[arg(long)]
    pattern: Option<String>,
    /// Only files modified after this date (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    modified_after: Option<String>,
    /// Only files modified before this date (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    modified_before: Option<String>,
    /// Restrict to one source directory.
    #[arg(long)]
    source: Option<String>,
    /// Restrict to one category directory.
    #[arg(long)]
    category: Option<String>,
    #[arg(long, value_enum)]
    on_failure: Option<PolicyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Abort,
    Continue,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => FailurePolicy::Abort,
            PolicyArg::Continue => FailurePolicy::Continue,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Flat,
    Nested,
}

impl From<LayoutArg> for LayoutStyle {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Flat => LayoutStyle::Flat,
            LayoutArg::Nested => LayoutStyle::Nested,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = config::config_file_path(cli.config.as_deref())?;
    let mut config = config::load_or_default(&config_path)?;

    match cli.command {
        Command::Watch(args) => {
            apply_watch_overrides(&mut config, &args);
            let runner = ContinuousRunner::new(
                &config,
                ProcessExtractor::new(config.extractor.clone()),
                SystemPacer,
            )?;
            match args.sweeps {
                Some(count) => {
                    runner.run_sweeps(count)?;
                }
                None => match runner.run_forever()? {},
            }
        }
        Command::Scan(args) => {
            apply_scan_overrides(&mut config, args);
            let runner = ScanRunner::new(
                &config,
                ProcessExtractor::new(config.extractor.clone()),
                SystemPacer,
            )?;
            let summary = runner.run()?;
            println!(
                "Processed {} of {} files ({} succeeded, {} failed).",
                summary.matched, summary.considered, summary.succeeded, summary.failed
            );
        }
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                bail!(
                    "Config file {} already exists; pass --force to overwrite",
                    config_path.display()
                );
            }
            config::save(&config, &config_path)?;
            println!("Configuration written to {}", config_path.display());
        }
        Command::History { limit } => {
            let Some(path) = config.events.log_path.clone() else {
                bail!("No event log configured; set [events] log_path in the config file");
            };
            let records = RunLog::new(&path)
                .load()
                .with_context(|| format!("Failed to read event log {}", path.display()))?;
            let skip = records.len().saturating_sub(limit);
            for record in records.iter().skip(skip) {
                println!(
                    "{} {:?} {}/{} files={} exit={} {}",
                    record.started_at.format("%Y-%m-%d %H:%M:%S"),
                    record.mode,
                    record.source,
                    record.category,
                    record.file_count,
                    record
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".into()),
                    record.input.display()
                );
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn apply_path_overrides(config: &mut AppConfig, args: &PathArgs) {
    if let Some(root) = &args.pdf_root {
        config.paths.pdf_root = root.clone();
    }
    if let Some(root) = &args.output_root {
        config.paths.output_root = root.clone();
    }
    if let Some(layout) = args.layout {
        config.layout.style = layout.into();
    }
}

fn apply_watch_overrides(config: &mut AppConfig, args: &WatchArgs) {
    apply_path_overrides(config, &args.paths);
    let batch = &mut config.batch;
    if let Some(size) = args.batch_size {
        batch.batch_size = size;
    }
    if let Some(pattern) = &args.pattern {
        batch.pattern = pattern.clone();
    }
    if let Some(secs) = args.batch_pause_secs {
        batch.batch_pause_secs = secs;
    }
    if let Some(secs) = args.sweep_pause_secs {
        batch.sweep_pause_secs = secs;
    }
    if let Some(policy) = args.on_failure {
        batch.failure_policy = policy.into();
    }
}

fn apply_scan_overrides(config: &mut AppConfig, args: ScanArgs) {
    apply_path_overrides(config, &args.paths);
    let scan = &mut config.scan;
    if let Some(pattern) = args.pattern {
        scan.pattern = pattern;
    }
    if args.modified_after.is_some() {
        scan.modified_after = args.modified_after;
    }
    if args.modified_before.is_some() {
        scan.modified_before = args.modified_before;
    }
    if let Some(source) = args.source {
        scan.source = source;
    }
    if let Some(category) = args.category {
        scan.category = category;
    }
    if let Some(policy) = args.on_failure {
        scan.failure_policy = policy.into();
    }
}
