//! Snapshot capture: record the working tree in `refs/stash` without
//! touching it.
//!
//! Two steps, mirroring what `git stash push` does internally minus the
//! reset: synthesize a stash commit (`git stash create`, plus an
//! untracked-files parent built in a throwaway index when requested), then
//! register it with `git stash store`. The working tree and the real index
//! are never written.

use crate::error::{Result, StashError};
use crate::git::{CommandExecutor, Git};
use chrono::{DateTime, Local};
use tempfile::TempDir;

pub const MESSAGE_PREFIX: &str = "auto-stash ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Full commit id of the stored stash entry.
    pub stash_id: String,
    pub message: String,
}

/// `auto-stash YYYY-MM-DD HH:MM:SS` for the given local time.
pub fn stash_message(at: DateTime<Local>) -> String {
    format!("{MESSAGE_PREFIX}{}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Capture the current modifications of the repository at `git.cwd()`.
///
/// Returns `Ok(None)` when there turned out to be nothing to store: the
/// changes were reverted after the probe, or the newest stash entry already
/// holds exactly this state.
pub fn capture<E: CommandExecutor>(
    git: &Git<'_, E>,
    include_untracked: bool,
    at: DateTime<Local>,
) -> Result<Option<Snapshot>> {
    let message = stash_message(at);

    let Some(commit) = create_snapshot(git, include_untracked, &message)? else {
        return Ok(None);
    };

    if matches_latest_stash(git, &commit)? {
        tracing::debug!(repo = %git.cwd().display(), "state already stashed");
        return Ok(None);
    }

    git.run(&["stash", "store", "-m", &message, &commit])
        .map_err(|e| StashError::StoreFailed {
            stash_id: commit.clone(),
            reason: e.to_string(),
        })?;

    Ok(Some(Snapshot {
        stash_id: commit,
        message,
    }))
}

/// Build the stash commit object. `None` when the tree is clean.
fn create_snapshot<E: CommandExecutor>(
    git: &Git<'_, E>,
    include_untracked: bool,
    message: &str,
) -> Result<Option<String>> {
    let tracked = git.run(&["stash", "create", message])?;
    if !include_untracked {
        return Ok(non_empty(tracked));
    }

    let Some(untracked_tree) = untracked_tree(git)? else {
        return Ok(non_empty(tracked));
    };

    let head = git.run(&["rev-parse", "--verify", "HEAD"])?;
    let (work_tree, index_commit) = if tracked.is_empty() {
        // Tracked files are clean, so index and work tree both equal HEAD.
        let head_tree = git.run(&["rev-parse", &format!("{head}^{{tree}}")])?;
        let index_commit = git.run(&[
            "commit-tree",
            &head_tree,
            "-p",
            &head,
            "-m",
            &format!("index on {message}"),
        ])?;
        (head_tree, index_commit)
    } else {
        let work_tree = git.run(&["rev-parse", &format!("{tracked}^{{tree}}")])?;
        let index_commit = git.run(&["rev-parse", &format!("{tracked}^2")])?;
        (work_tree, index_commit)
    };

    let untracked_commit = git.run(&[
        "commit-tree",
        &untracked_tree,
        "-m",
        &format!("untracked files on {message}"),
    ])?;

    let stash = git.run(&[
        "commit-tree",
        &work_tree,
        "-p",
        &head,
        "-p",
        &index_commit,
        "-p",
        &untracked_commit,
        "-m",
        message,
    ])?;
    Ok(Some(stash))
}

/// Tree holding only the untracked, non-ignored files, built in a private
/// index so the repository's own index is left alone.
fn untracked_tree<E: CommandExecutor>(git: &Git<'_, E>) -> Result<Option<String>> {
    let listing = git.run_raw(&["ls-files", "--others", "--exclude-standard", "-z"], &[])?;
    let files: Vec<&str> = listing.split('\0').filter(|f| !f.is_empty()).collect();
    if files.is_empty() {
        return Ok(None);
    }

    let scratch = TempDir::new()?;
    let pathspec = scratch.path().join("pathspec");
    let mut nul_list = files.join("\0");
    nul_list.push('\0');
    std::fs::write(&pathspec, nul_list)?;

    let envs = vec![
        (
            "GIT_INDEX_FILE".to_string(),
            scratch.path().join("index").to_string_lossy().into_owned(),
        ),
        ("GIT_LITERAL_PATHSPECS".to_string(), "1".to_string()),
    ];
    let pathspec_arg = format!("--pathspec-from-file={}", pathspec.display());
    git.run_with_env(&["add", &pathspec_arg, "--pathspec-file-nul"], &envs)?;
    let tree = git.run_with_env(&["write-tree"], &envs)?;
    Ok(Some(tree))
}

/// Compare the work-tree, index and untracked trees of `commit` with the
/// newest entry in `refs/stash`.
fn matches_latest_stash<E: CommandExecutor>(git: &Git<'_, E>, commit: &str) -> Result<bool> {
    let latest = git.output(&["rev-parse", "--verify", "--quiet", "refs/stash"])?;
    if !latest.success {
        return Ok(false);
    }
    let latest = latest.stdout.trim().to_string();
    if latest.is_empty() {
        return Ok(false);
    }
    Ok(fingerprint(git, &latest)? == fingerprint(git, commit)?)
}

fn fingerprint<E: CommandExecutor>(git: &Git<'_, E>, rev: &str) -> Result<[Option<String>; 3]> {
    Ok([
        tree_of(git, rev)?,
        tree_of(git, &format!("{rev}^2"))?,
        tree_of(git, &format!("{rev}^3"))?,
    ])
}

fn tree_of<E: CommandExecutor>(git: &Git<'_, E>, rev: &str) -> Result<Option<String>> {
    let out = git.output(&["rev-parse", "--verify", "--quiet", &format!("{rev}^{{tree}}")])?;
    Ok(if out.success {
        non_empty(out.stdout.trim().to_string())
    } else {
        None
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
