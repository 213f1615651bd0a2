//! Commuting-merge resolver.
//!
//! Checks out `branch_a`, merges `branch_b` into it without committing, and
//! resolves every conflicted file whose two sets of edits commute. Files that
//! do not commute are reported and, by default, the merge is aborted.
//!
//! Exit codes: 0 when everything resolved, 1 when files stay unresolved or
//! anything fails, 2 when a precondition fails before the repository is
//! touched.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commute_core::conflict::Reconstructor;
use commute_core::{CommuteConfig, CoreError, GitClient, MergeDriver, MergeOptions, MergeReport};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Merge a branch, auto-resolving conflicts whose edits commute.
#[derive(Parser, Debug)]
#[command(name = "commute-merge", version)]
struct Cli {
    /// Merge target; checked out first.
    branch_a: String,

    /// Merge source.
    branch_b: String,

    /// Skip the clean working tree check.
    #[arg(long)]
    allow_dirty: bool,

    /// Leave the merge in progress instead of aborting on failure.
    #[arg(long)]
    keep_merge: bool,

    /// Commit the merge when every file is resolved.
    #[arg(long)]
    auto_continue: bool,

    /// Treat inserts by both sides at the same position as a conflict.
    #[arg(long)]
    strict_commute: bool,

    /// Directory of recorded resolutions to replay for non-commuting files.
    #[arg(long, value_name = "DIR")]
    replay_store: Option<PathBuf>,

    /// Print the merge report as JSON.
    #[arg(long)]
    json: bool,

    /// Path to the repository.
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    /// Path to the TOML configuration file (default: `.commute.toml` in the
    /// repository root, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `commute_core=trace`.
    #[arg(long)]
    log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };

    match run(&cli) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", style::failure(&format!("{:#}", e)));
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<MergeReport> {
    let client = GitClient::new(&cli.repo).context("failed to open repository")?;
    let config = CommuteConfig::discover(cli.config.as_deref(), client.workdir())
        .context("failed to load configuration")?;
    init_tracing(cli.log_level.as_deref(), &config.log.level);

    let options = merge_options(cli, &config, client.workdir());
    debug!(?options, "resolved merge options");
    let report = MergeDriver::new(&client, options)
        .run(&cli.branch_a, &cli.branch_b)
        .with_context(|| format!("failed to merge '{}' into '{}'", cli.branch_b, cli.branch_a))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_summary(&report);
    }
    Ok(report)
}

/// Logs go to stderr. `--log-level` wins over `RUST_LOG`, which wins over
/// the config file.
fn init_tracing(flag: Option<&str>, config_level: &str) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Config supplies defaults; flags can only switch behavior on.
fn merge_options(cli: &Cli, config: &CommuteConfig, workdir: &Path) -> MergeOptions {
    let mut options = MergeOptions::from_config(&config.merge);
    options.allow_dirty |= cli.allow_dirty;
    options.keep_merge |= cli.keep_merge;
    options.auto_continue |= cli.auto_continue;
    options.strict_commute |= cli.strict_commute;
    options.replay_store = match &cli.replay_store {
        Some(dir) => Some(dir.clone()),
        None => config.merge.replay_store.as_ref().map(|dir| workdir.join(dir)),
    };
    options.reconstructor = Reconstructor::new(config.record.backend, config.record.marker_size);
    options
}

/// Usage errors share exit code 1 with runtime failures; 2 is reserved for
/// precondition failures. `--help` and `--version` succeed.
fn usage_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CoreError>() {
        Some(core) if core.is_precondition() => 2,
        _ => 1,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_summary(report: &MergeReport) {
    println!("{}", style::merge_heading(&report.source, &report.target));

    if report.up_to_date {
        println!("Already up to date.");
        return;
    }

    for path in &report.resolved {
        println!("{}", style::staged(path, "edits commute, staged"));
    }
    for path in &report.replayed {
        println!("{}", style::staged(path, "recorded resolution replayed, staged"));
    }
    for path in &report.deleted {
        println!("{}", style::staged(path, "removal staged"));
    }

    if !report.unresolved.is_empty() {
        println!();
        println!("{}", style::unresolved_count(report.unresolved.len()));

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["File", "Reason"]);
        for file in &report.unresolved {
            table.add_row(vec![
                Cell::new(&file.path),
                Cell::new(file.reason.to_string()).fg(comfy_table::Color::Red),
            ]);
        }
        println!("{table}");
    }

    println!();
    println!("{} {}", style::label("Merge state:"), style::state(report.state));
    if let Some(sha) = &report.commit {
        println!("{} {sha}", style::label("Committed"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commute_core::errors::SessionError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("commute-merge").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let cli = parse(&["main", "feature", "--keep-merge", "-C", "/tmp/repo"]);
        assert_eq!(cli.branch_a, "main");
        assert_eq!(cli.branch_b, "feature");
        assert!(cli.keep_merge);
        assert!(!cli.auto_continue);
        assert_eq!(cli.repo, PathBuf::from("/tmp/repo"));
    }

    #[test]
    fn test_missing_branch_is_a_usage_error() {
        let err = Cli::try_parse_from(["commute-merge", "main"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);

        let err = Cli::try_parse_from(["commute-merge", "main", "feature", "--bogus"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);

        let help = Cli::try_parse_from(["commute-merge", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&help), 0);
    }

    #[test]
    fn test_flags_layer_over_config() {
        let mut config = CommuteConfig::default();
        config.merge.keep_merge = true;
        config.merge.replay_store = Some(PathBuf::from("store"));

        let cli = parse(&["main", "feature", "--strict-commute"]);
        let options = merge_options(&cli, &config, Path::new("/repo"));
        assert!(options.keep_merge);
        assert!(options.strict_commute);
        assert!(!options.allow_dirty);
        assert_eq!(options.replay_store, Some(PathBuf::from("/repo/store")));

        let cli = parse(&["main", "feature", "--replay-store", "elsewhere"]);
        let options = merge_options(&cli, &config, Path::new("/repo"));
        assert_eq!(options.replay_store, Some(PathBuf::from("elsewhere")));
    }

    #[test]
    fn test_exit_codes() {
        let precondition = anyhow::Error::from(CoreError::from(SessionError::DirtyWorktree))
            .context("failed to merge");
        assert_eq!(exit_code_for(&precondition), 2);

        let other = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&other), 1);
    }
}
