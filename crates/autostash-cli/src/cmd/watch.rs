use crate::locate::Locations;
use anyhow::{bail, Context};
use autostash_core::audit::AuditLog;
use autostash_core::config::{check_interval, Config};
use autostash_core::git::git_bin;
use autostash_core::job::{RepoJob, StashJob};
use autostash_core::paths::normalize_path;
use autostash_core::report::{Format, Reporter};
use autostash_core::scheduler::{CancelToken, Clock, Scheduler, SystemClock};
use autostash_core::tracklist::Tracklist;
use clap::builder::PossibleValuesParser;
use clap::Args;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between checks (default: config `interval_secs`, 20)
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Include untracked files in both change detection and the snapshot
    #[arg(short = 'u', long)]
    pub include_untracked: bool,

    /// Watch this repository only, ignoring the tracklist
    #[arg(long, value_name = "PATH")]
    pub cwd: Option<String>,

    /// Output format (default: config `format`, line)
    #[arg(long, value_parser = PossibleValuesParser::new(["line", "pretty"]))]
    pub format: Option<String>,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// Audit log file (default: config `log_file`, then the config directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

pub fn run(loc: &Locations, args: WatchArgs) -> anyhow::Result<()> {
    let config = Config::load(&loc.config)
        .with_context(|| format!("failed to load config {}", loc.config.display()))?;

    let interval = args.interval.unwrap_or(config.interval_secs);
    check_interval(interval).context("invalid --interval")?;
    let include_untracked = args.include_untracked || config.include_untracked;
    let format: Format = match &args.format {
        Some(f) => f.parse()?,
        None => config.format,
    };

    let repos: Vec<PathBuf> = match &args.cwd {
        Some(p) => vec![normalize_path(p).with_context(|| format!("invalid path '{p}'"))?],
        None => Tracklist::load(&loc.trackfile)
            .with_context(|| format!("failed to read tracklist {}", loc.trackfile.display()))?
            .items()
            .to_vec(),
    };
    if repos.is_empty() {
        bail!(
            "no tracked directories in {}; add one with `auto-stash add <path>` or pass --cwd",
            loc.trackfile.display()
        );
    }

    git_bin().context("git is required to watch repositories")?;

    let log_path = match args.log_file {
        Some(p) => p,
        None => config.log_path().context("cannot locate audit log")?,
    };
    let audit = AuditLog::init(&log_path)
        .with_context(|| format!("cannot prepare audit log {}", log_path.display()))?;

    let stdout = std::io::stdout();
    let color = stdout.is_terminal();
    let mut reporter = Reporter::new(format, color, audit, stdout);

    let cancel = CancelToken::new();
    let job = StashJob::new(include_untracked);
    let mut scheduler = Scheduler::new(
        repos,
        std::time::Duration::from_secs(interval),
        SystemClock,
        job,
        cancel.clone(),
    )?;

    if args.once {
        let tick = scheduler.run_once();
        reporter.emit(&tick).context("failed to write report")?;
        return Ok(());
    }

    spawn_interrupt_listener(cancel).context("failed to install Ctrl+C handler")?;

    let banner = started_banner(scheduler.repos().len(), interval, include_untracked);
    tracing::info!(log = %reporter.audit().path().display(), "watching");
    supervise(&mut scheduler, &mut reporter, &banner)
}

fn started_banner(repos: usize, interval: u64, include_untracked: bool) -> String {
    format!(
        "=== Git Auto Stash Watcher Started ({repos} repos, every {interval}s, untracked: {}) ===",
        if include_untracked { "yes" } else { "no" },
    )
}

/// Record the start event, tick until the scheduler's token is cancelled,
/// then record the stop event. Report failures inside the loop are logged
/// and the loop carries on.
fn supervise<C, J, W>(
    scheduler: &mut Scheduler<C, J>,
    reporter: &mut Reporter<W>,
    banner: &str,
) -> anyhow::Result<()>
where
    C: Clock,
    J: RepoJob,
    W: Write,
{
    reporter.event(banner)?;
    scheduler.run(|tick| {
        if let Err(e) = reporter.emit(tick) {
            tracing::warn!("failed to write report: {e}");
        }
    });
    reporter.event(STOPPED)?;
    Ok(())
}

const STOPPED: &str = "=== Git Auto Stash Watcher Stopped by user ===";

/// First Ctrl+C asks the loop to stop at its next safe point; a second one
/// exits immediately, for when a git call is hung.
fn spawn_interrupt_listener(cancel: CancelToken) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            rt.block_on(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                tracing::info!("interrupt received, stopping after the current step");
                cancel.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cancelled_watch_logs_start_and_stop() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs/auto_stash.log");
        let audit = AuditLog::init(&log_path).unwrap();
        let mut reporter = Reporter::new(Format::Line, false, audit, Vec::new());

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut scheduler = Scheduler::new(
            vec![dir.path().to_path_buf()],
            std::time::Duration::from_secs(20),
            SystemClock,
            StashJob::new(false),
            cancel,
        )
        .unwrap();

        let banner = started_banner(1, 20, false);
        supervise(&mut scheduler, &mut reporter, &banner).unwrap();

        let logged = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        assert_eq!(lines.len(), 2, "no tick should run: {logged}");
        assert!(lines[0].ends_with(
            "=== Git Auto Stash Watcher Started (1 repos, every 20s, untracked: no) ==="
        ));
        assert!(lines[1].ends_with(STOPPED));
        assert!(lines[1].starts_with('['));
    }

    #[test]
    fn banner_mentions_untracked_mode() {
        assert!(started_banner(3, 5, true).contains("(3 repos, every 5s, untracked: yes)"));
    }
}
