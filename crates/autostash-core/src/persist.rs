//! Replace-on-write for the tracklist and config files.

use crate::error::{Result, StashError};
use std::io::Write;
use std::path::Path;

const STAGING_PREFIX: &str = ".auto-stash-";

/// Write `contents` to a staging file beside `path`, flush it to disk, then
/// rename it over `path`. Readers see either the previous file or the new
/// one, never a truncated mix. Missing parent directories are created.
pub fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let fail = |source: std::io::Error| StashError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(fail)?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(fail)?;
    staged.write_all(contents.as_bytes()).map_err(fail)?;
    staged.as_file().sync_all().map_err(fail)?;
    staged.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(STAGING_PREFIX))
            .collect()
    }

    #[test]
    fn creates_missing_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("git-auto-stash/tracklist.txt");
        replace_file(&path, "/home/me/repo\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/home/me/repo\n");
    }

    #[test]
    fn rewrite_swaps_content_without_staging_debris() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracklist.txt");
        replace_file(&path, "/a\n/b\n").unwrap();
        replace_file(&path, "/a\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/a\n");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn failure_names_the_target() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let target = blocker.join("config.yaml");

        match replace_file(&target, "interval_secs: 5\n") {
            Err(StashError::Persist { path, .. }) => assert_eq!(path, target),
            other => panic!("expected Persist error, got {other:?}"),
        }
    }
}
