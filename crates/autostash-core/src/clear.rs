//! Removal of stash entries across tracked repositories.

use crate::capture::MESSAGE_PREFIX;
use crate::error::{Result, StashError};
use crate::git::{CommandExecutor, Git};
use crate::job::NOT_A_REPO;
use crate::probe::is_version_controlled;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Only entries whose message starts with `auto-stash `.
    AutoOnly,
    /// Every entry (`git stash clear`).
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearResult {
    Dropped(usize),
    Skipped(String),
    Failed(String),
}

pub fn clear_repo<E: CommandExecutor>(path: &Path, scope: ClearScope, executor: &E) -> ClearResult {
    if !is_version_controlled(path, executor) {
        return ClearResult::Skipped(NOT_A_REPO.to_string());
    }
    let git = Git::new(path, executor);
    let result = match scope {
        ClearScope::All => clear_all(&git),
        ClearScope::AutoOnly => drop_auto_entries(&git),
    };
    match result {
        Ok(n) => ClearResult::Dropped(n),
        Err(e) => ClearResult::Failed(e.to_string()),
    }
}

fn clear_all<E: CommandExecutor>(git: &Git<'_, E>) -> Result<usize> {
    let count = list_entries(git)?.len();
    git.run(&["stash", "clear"])?;
    Ok(count)
}

/// Drop highest index first so lower indices stay valid.
fn drop_auto_entries<E: CommandExecutor>(git: &Git<'_, E>) -> Result<usize> {
    let mut indices: Vec<usize> = list_entries(git)?
        .into_iter()
        .filter(|(_, subject)| subject.starts_with(MESSAGE_PREFIX))
        .map(|(index, _)| index)
        .collect();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    for index in &indices {
        git.run(&["stash", "drop", "-q", &format!("stash@{{{index}}}")])?;
    }
    Ok(indices.len())
}

/// `(index, reflog subject)` for every stash entry.
fn list_entries<E: CommandExecutor>(git: &Git<'_, E>) -> Result<Vec<(usize, String)>> {
    let out = git.run(&["stash", "list", "--format=%gd%x00%gs"])?;
    out.lines()
        .filter(|l| !l.is_empty())
        .map(|line| {
            let (selector, subject) = line.split_once('\0').unwrap_or((line, ""));
            let index = selector
                .strip_prefix("stash@{")
                .and_then(|s| s.strip_suffix('}'))
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| StashError::UnexpectedOutput {
                    command: "git stash list".to_string(),
                    output: line.to_string(),
                })?;
            Ok((index, subject.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::{have_git, init_repo, ScriptedExecutor};
    use crate::git::ProcessCommandExecutor;
    use tempfile::TempDir;

    #[test]
    fn drops_only_auto_entries_newest_index_first() {
        let dir = TempDir::new().unwrap();
        let exec = ScriptedExecutor::new()
            .ok("true\n")
            .ok("stash@{0}\0auto-stash 2026-01-01 10:00:20\nstash@{1}\0On main: manual\nstash@{2}\0auto-stash 2026-01-01 10:00:00\n")
            .ok("")
            .ok("");
        let result = clear_repo(dir.path(), ClearScope::AutoOnly, &exec);
        assert_eq!(result, ClearResult::Dropped(2));
        let commands = exec.commands();
        assert_eq!(commands[2], "stash drop -q stash@{2}");
        assert_eq!(commands[3], "stash drop -q stash@{0}");
    }

    #[test]
    fn garbled_listing_fails() {
        let dir = TempDir::new().unwrap();
        let exec = ScriptedExecutor::new().ok("true\n").ok("what\0is this\n");
        assert!(matches!(
            clear_repo(dir.path(), ClearScope::AutoOnly, &exec),
            ClearResult::Failed(_)
        ));
    }

    #[test]
    fn non_repo_is_skipped() {
        let exec = ScriptedExecutor::new();
        assert_eq!(
            clear_repo(Path::new("/no/such/repo"), ClearScope::All, &exec),
            ClearResult::Skipped(NOT_A_REPO.to_string())
        );
    }

    #[test]
    fn real_repo_keeps_manual_stashes() {
        if !have_git() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        let exec = ProcessCommandExecutor;
        let git = Git::new(dir.path(), &exec);

        std::fs::write(dir.path().join("README.md"), "manual\n").unwrap();
        git.run(&["stash", "push", "-q", "-m", "by hand"]).unwrap();
        std::fs::write(dir.path().join("README.md"), "auto\n").unwrap();
        assert!(matches!(
            crate::job::run_job(dir.path(), false, &exec).status(),
            crate::outcome::Status::Stashed
        ));

        assert_eq!(
            clear_repo(dir.path(), ClearScope::AutoOnly, &exec),
            ClearResult::Dropped(1)
        );
        let left = git.run(&["stash", "list", "--format=%gs"]).unwrap();
        assert!(left.contains("by hand"));
        assert!(!left.contains("auto-stash"));

        assert_eq!(
            clear_repo(dir.path(), ClearScope::All, &exec),
            ClearResult::Dropped(1)
        );
    }
}
