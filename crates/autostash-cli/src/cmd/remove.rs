use crate::locate::Locations;
use crate::output::print_result;
use anyhow::Context;
use autostash_core::tracklist::{self, RemoveResult};

pub fn run(loc: &Locations, path: &str, json: bool) -> anyhow::Result<()> {
    let result = tracklist::remove(&loc.trackfile, path)
        .with_context(|| format!("failed to update tracklist {}", loc.trackfile.display()))?;

    let (removed, norm) = match &result {
        RemoveResult::Removed(p) => (true, p),
        RemoveResult::NotFound(p) => (false, p),
    };
    print_result(
        json,
        &serde_json::json!({ "path": norm, "removed": removed }),
        &result,
    )
}
