use crate::error::Result;
use crate::git::{CommandExecutor, Git};
use std::path::Path;

/// True when `path` is inside a git working tree.
///
/// Fails closed: a missing directory, a bare repository, a non-repository or
/// any failure to run git all report `false`.
pub fn is_version_controlled<E: CommandExecutor>(path: &Path, executor: &E) -> bool {
    if !path.is_dir() {
        return false;
    }
    match Git::new(path, executor).run(&["rev-parse", "--is-inside-work-tree"]) {
        Ok(out) => out == "true",
        Err(e) => {
            tracing::debug!(path = %path.display(), "not a work tree: {e}");
            false
        }
    }
}

/// True when the working tree has uncommitted modifications.
///
/// With `include_untracked == false` only staged or modified tracked files
/// count. Read-only: `git status` never touches the tree.
pub fn has_changes<E: CommandExecutor>(
    path: &Path,
    include_untracked: bool,
    executor: &E,
) -> Result<bool> {
    let mut args = vec!["status", "--porcelain"];
    if !include_untracked {
        args.push("--untracked-files=no");
    }
    let out = Git::new(path, executor).run(&args)?;
    Ok(!out.is_empty())
}
