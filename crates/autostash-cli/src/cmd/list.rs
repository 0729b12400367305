use crate::locate::Locations;
use crate::output::print_json;
use anyhow::Context;
use autostash_core::git::ProcessCommandExecutor;
use autostash_core::probe::is_version_controlled;
use autostash_core::tracklist::Tracklist;
use std::path::{Path, PathBuf};

const PATH_HEADER: &str = "PATH";
const STATE_HEADER: &str = "STATE";

/// What a tracked entry currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Repo,
    NotARepo,
    Missing,
}

impl EntryState {
    fn of(path: &Path) -> Self {
        if !path.exists() {
            Self::Missing
        } else if is_version_controlled(path, &ProcessCommandExecutor) {
            Self::Repo
        } else {
            Self::NotARepo
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Repo => "repo",
            Self::NotARepo => "not a repo",
            Self::Missing => "missing",
        }
    }
}

pub fn run(loc: &Locations, json: bool) -> anyhow::Result<()> {
    let list = Tracklist::load(&loc.trackfile)
        .with_context(|| format!("failed to read tracklist {}", loc.trackfile.display()))?;
    let entries: Vec<(PathBuf, EntryState)> = list
        .items()
        .iter()
        .map(|p| (p.clone(), EntryState::of(p)))
        .collect();

    if json {
        let paths: Vec<_> = entries
            .iter()
            .map(|(p, state)| serde_json::json!({ "path": p, "state": state.as_str() }))
            .collect();
        return print_json(&serde_json::json!({
            "trackfile": loc.trackfile,
            "paths": paths,
        }));
    }

    if entries.is_empty() {
        println!("No tracked directories ({}).", loc.trackfile.display());
        println!("Add one with: auto-stash add <path>");
        return Ok(());
    }

    for line in render(&entries) {
        println!("{line}");
    }
    Ok(())
}

/// Two columns, the path column padded to its widest entry.
fn render(entries: &[(PathBuf, EntryState)]) -> Vec<String> {
    let paths: Vec<String> = entries.iter().map(|(p, _)| p.display().to_string()).collect();
    let width = paths
        .iter()
        .map(|p| p.chars().count())
        .chain(std::iter::once(PATH_HEADER.len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(entries.len() + 2);
    lines.push(format!("{PATH_HEADER:<width$}  {STATE_HEADER}"));
    lines.push(format!("{}  {}", "-".repeat(width), "-".repeat(STATE_HEADER.len())));
    for (path, (_, state)) in paths.iter().zip(entries) {
        lines.push(format!("{path:<width$}  {}", state.as_str()));
    }
    lines
}
