use crate::locate::Locations;
use crate::output::print_result;
use anyhow::Context;
use autostash_core::git::ProcessCommandExecutor;
use autostash_core::probe::is_version_controlled;
use autostash_core::tracklist::{self, AddResult};

pub fn run(loc: &Locations, path: &str, json: bool) -> anyhow::Result<()> {
    let result = tracklist::add(&loc.trackfile, path)
        .with_context(|| format!("failed to update tracklist {}", loc.trackfile.display()))?;

    let (added, norm) = match &result {
        AddResult::Added(p) => (true, p),
        AddResult::AlreadyExists(p) => (false, p),
    };

    if added && !is_version_controlled(norm, &ProcessCommandExecutor) {
        eprintln!(
            "warning: {} is not a git working tree; it will be skipped until it is",
            norm.display()
        );
    }

    print_result(
        json,
        &serde_json::json!({ "path": norm, "added": added }),
        &result,
    )
}
