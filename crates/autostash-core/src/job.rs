use crate::capture::capture;
use crate::git::{CommandExecutor, Git, ProcessCommandExecutor};
use crate::outcome::Outcome;
use crate::probe::{has_changes, is_version_controlled};
use chrono::{DateTime, Local};
use std::path::Path;

pub const NOT_A_REPO: &str = "not a git repository";

/// Work performed for one repository on every tick.
pub trait RepoJob {
    fn run(&self, repo: &Path) -> Outcome;
}

/// Probe the repository and snapshot its changes into the stash.
///
/// Every failure is folded into the returned [`Outcome`]; nothing escapes.
pub fn run_job<E: CommandExecutor>(path: &Path, include_untracked: bool, executor: &E) -> Outcome {
    run_job_at(path, include_untracked, Local::now(), executor)
}

pub fn run_job_at<E: CommandExecutor>(
    path: &Path,
    include_untracked: bool,
    at: DateTime<Local>,
    executor: &E,
) -> Outcome {
    if !is_version_controlled(path, executor) {
        return Outcome::skipped(path, NOT_A_REPO);
    }

    match has_changes(path, include_untracked, executor) {
        Ok(false) => return Outcome::no_changes(path),
        Ok(true) => {}
        Err(e) => return Outcome::error(path, e.to_string()),
    }

    let git = Git::new(path, executor);
    match capture(&git, include_untracked, at) {
        Ok(Some(snapshot)) => Outcome::stashed(path, snapshot.stash_id, snapshot.message),
        Ok(None) => Outcome::no_changes(path),
        Err(e) => Outcome::error(path, e.to_string()),
    }
}

/// The production job: one `include_untracked` setting shared by the probe
/// and the capture.
#[derive(Debug, Clone)]
pub struct StashJob<E = ProcessCommandExecutor> {
    include_untracked: bool,
    executor: E,
}

impl StashJob<ProcessCommandExecutor> {
    pub fn new(include_untracked: bool) -> Self {
        Self {
            include_untracked,
            executor: ProcessCommandExecutor,
        }
    }
}

impl<E: CommandExecutor> StashJob<E> {
    pub fn with_executor(include_untracked: bool, executor: E) -> Self {
        Self {
            include_untracked,
            executor,
        }
    }
}

impl<E: CommandExecutor> RepoJob for StashJob<E> {
    fn run(&self, repo: &Path) -> Outcome {
        run_job(repo, self.include_untracked, &self.executor)
    }
}
