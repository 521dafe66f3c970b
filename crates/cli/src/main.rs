// sprout CLI entry point.
//
// No flag ever produces a non-zero exit: failures are logged to stderr and
// the process ends normally, so a cron-driven run never wedges the
// schedule on a transient error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sprout_core::config::Config;
use sprout_core::driver::CommitDriver;
use sprout_core::schedule;

/// Days of history to fabricate when `--backfill` gets no usable number.
const DEFAULT_BACKFILL_DAYS: u32 = 30;

#[derive(Parser)]
#[command(name = "sprout", about = "Keep a repository's activity log growing on a schedule")]
#[command(version)]
struct Cli {
    /// Fabricate activity for the past N days instead of running today's
    /// schedule
    #[arg(long, value_name = "DAYS")]
    backfill: Option<String>,

    /// Print a crontab line for the daily run and exit
    #[arg(long)]
    setup_cron: bool,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    repo: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        tracing::error!("run failed: {error:#}");
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let repo_root = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir().context("cannot resolve current directory")?,
    };

    if cli.setup_cron {
        println!("{}", cron_line(&repo_root)?);
        return Ok(());
    }

    let config = Config::load(&repo_root);
    let driver = CommitDriver::new(&repo_root, config);
    let mut rng = StdRng::from_entropy();

    match cli.backfill {
        Some(raw) => {
            let days = parse_backfill_days(&raw);
            let plan = schedule::backfill_plan(&mut rng, days);
            info!(days, planned = plan.commit_count(), "running backfill");

            let committed = driver.run_backfill(&mut rng, Local::now(), &plan).await;
            info!(committed, "backfill finished");
        }
        None => {
            let day = schedule::day_schedule(&mut rng);
            let times: Vec<String> = day.times.iter().map(ToString::to_string).collect();
            info!(schedule = %times.join(", "), "running today's commits");

            let committed = driver.run_daily(&mut rng, Local::now(), &day).await;
            info!(committed, "daily run finished");
        }
    }

    Ok(())
}

/// Lenient day-count parsing: anything unusable falls back to the default
/// rather than failing the run.
fn parse_backfill_days(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(DEFAULT_BACKFILL_DAYS)
}

/// Crontab line that runs the daily schedule at 09:00.
fn cron_line(repo_root: &Path) -> anyhow::Result<String> {
    let exe = std::env::current_exe().context("cannot resolve executable path")?;
    Ok(format!("0 9 * * * cd {} && {}", repo_root.display(), exe.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_days_parse_leniently() {
        assert_eq!(parse_backfill_days("14"), 14);
        assert_eq!(parse_backfill_days(" 7 "), 7);
        assert_eq!(parse_backfill_days("0"), 0);
        assert_eq!(parse_backfill_days("soon"), DEFAULT_BACKFILL_DAYS);
        assert_eq!(parse_backfill_days(""), DEFAULT_BACKFILL_DAYS);
        assert_eq!(parse_backfill_days("-3"), DEFAULT_BACKFILL_DAYS);
    }

    #[test]
    fn cron_line_runs_at_nine_in_the_target_repo() {
        let line = cron_line(Path::new("/work/repo")).unwrap();
        assert!(line.starts_with("0 9 * * * "));
        assert!(line.contains("cd /work/repo && "));
    }

    #[test]
    fn cli_parses_the_flag_surface() {
        let cli = Cli::parse_from(["sprout", "--backfill", "14", "--repo", "/work/repo"]);
        assert_eq!(cli.backfill.as_deref(), Some("14"));
        assert_eq!(cli.repo, Some(PathBuf::from("/work/repo")));
        assert!(!cli.setup_cron);

        let cli = Cli::parse_from(["sprout", "--setup-cron"]);
        assert!(cli.setup_cron);
        assert!(cli.backfill.is_none());
    }
}
