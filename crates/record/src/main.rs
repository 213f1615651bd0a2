//! Hunk resolution extractor.
//!
//! Given the ours / base / theirs snapshots of a file and the file as a human
//! resolved it, rebuilds the original conflict, slices out the resolution of
//! each hunk, and stores each one in a flat directory under its resolution
//! key. Keys are printed to stdout in hunk order, one per line.
//!
//! Exit codes: 0 on success, 1 on a usage error or any failure, including a
//! conflict with no hunks.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commute_core::config::RecordConfig;
use commute_core::conflict::{
    record_resolutions, MergeBackend, PutOutcome, Reconstructor, ResolutionStore,
    DEFAULT_MARKER_SIZE,
};
use commute_core::CommuteConfig;

/// Record per-hunk conflict resolutions into a content-addressed store.
#[derive(Parser, Debug)]
#[command(name = "commute-record", version)]
struct Cli {
    /// Snapshot of "ours".
    ours: PathBuf,

    /// Snapshot of the common ancestor.
    base: PathBuf,

    /// Snapshot of "theirs".
    theirs: PathBuf,

    /// The file after a human resolved the conflict.
    resolved: PathBuf,

    /// Logical path of the file, used only for keying.
    path: String,

    /// Store directory; one file is written per hunk.
    out_dir: PathBuf,

    /// Three-way merge primitive used to rebuild the conflict: diffy or git.
    #[arg(long)]
    backend: Option<MergeBackend>,

    /// Length of conflict marker runs.
    #[arg(long)]
    marker_size: Option<usize>,

    /// Print keys without writing to the store.
    #[arg(long)]
    dry_run: bool,

    /// Path to the TOML configuration file (default: `.commute.toml` in the
    /// current directory, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures.
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match CommuteConfig::discover(cli.config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {e}");
            return ExitCode::from(1);
        }
    };
    init_tracing(cli.log_level.as_deref(), &config.log.level);

    let stdout = io::stdout();
    match record(&cli, &config.record, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(flag: Option<&str>, config_level: &str) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn read(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {what} '{}'", path.display()))
}

/// Record every hunk and write its key to `out`. Returns the number of hunks.
fn record(cli: &Cli, config: &RecordConfig, out: &mut impl Write) -> Result<usize> {
    let backend = cli.backend.unwrap_or(config.backend);
    let marker_size = cli.marker_size.unwrap_or(config.marker_size);
    if marker_size < DEFAULT_MARKER_SIZE {
        anyhow::bail!("--marker-size must be at least {DEFAULT_MARKER_SIZE}");
    }

    let ours = read(&cli.ours, "ours")?;
    let base = read(&cli.base, "base")?;
    let theirs = read(&cli.theirs, "theirs")?;
    let resolved = read(&cli.resolved, "resolved file")?;

    let reconstructor = Reconstructor::new(backend, marker_size);
    let hunks = record_resolutions(&reconstructor, &base, &ours, &theirs, &resolved, &cli.path)
        .with_context(|| format!("failed to record resolutions for '{}'", cli.path))?;

    let store = if cli.dry_run {
        None
    } else {
        Some(ResolutionStore::open(&cli.out_dir).context("failed to open output directory")?)
    };

    for hunk in &hunks {
        if let Some(store) = &store {
            let outcome = store
                .put(&hunk.key, &hunk.resolution)
                .with_context(|| format!("failed to store resolution {}", hunk.key))?;
            if outcome == PutOutcome::KeptExisting {
                eprintln!("warning: kept existing, different resolution for {}", hunk.key);
            }
        }
        writeln!(out, "{}", hunk.key).context("failed to write key")?;
    }

    info!(path = %cli.path, hunks = hunks.len(), dry_run = cli.dry_run, "recorded resolutions");
    Ok(hunks.len())
}
