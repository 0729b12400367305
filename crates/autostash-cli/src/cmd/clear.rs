use crate::locate::Locations;
use crate::output::print_json;
use anyhow::{bail, Context};
use autostash_core::clear::{clear_repo, ClearResult, ClearScope};
use autostash_core::git::{git_bin, ProcessCommandExecutor};
use autostash_core::paths::normalize_path;
use autostash_core::tracklist::Tracklist;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClearArgs {
    /// Drop every stash entry, not just auto-stash ones
    #[arg(long)]
    pub all: bool,

    /// Clear this repository only, ignoring the tracklist
    #[arg(long, value_name = "PATH")]
    pub cwd: Option<String>,
}

pub fn run(loc: &Locations, args: ClearArgs, json: bool) -> anyhow::Result<()> {
    let repos: Vec<PathBuf> = match &args.cwd {
        Some(p) => vec![normalize_path(p).with_context(|| format!("invalid path '{p}'"))?],
        None => Tracklist::load(&loc.trackfile)
            .with_context(|| format!("failed to read tracklist {}", loc.trackfile.display()))?
            .items()
            .to_vec(),
    };
    if repos.is_empty() {
        println!("No tracked directories; nothing to clear.");
        return Ok(());
    }
    git_bin().context("git is required to clear stashes")?;

    let scope = if args.all {
        ClearScope::All
    } else {
        ClearScope::AutoOnly
    };

    let results: Vec<(PathBuf, ClearResult)> = repos
        .into_iter()
        .map(|repo| {
            let result = clear_repo(&repo, scope, &ProcessCommandExecutor);
            (repo, result)
        })
        .collect();
    let failed = results
        .iter()
        .filter(|(_, r)| matches!(r, ClearResult::Failed(_)))
        .count();

    if json {
        let entries: Vec<_> = results
            .iter()
            .map(|(repo, result)| match result {
                ClearResult::Dropped(n) => serde_json::json!({ "repo": repo, "dropped": n }),
                ClearResult::Skipped(d) => serde_json::json!({ "repo": repo, "skipped": d }),
                ClearResult::Failed(d) => serde_json::json!({ "repo": repo, "error": d }),
            })
            .collect();
        print_json(&entries)?;
    } else {
        for (repo, result) in &results {
            match result {
                ClearResult::Dropped(n) => println!("cleared {n:>3}  {}", repo.display()),
                ClearResult::Skipped(d) => println!("skipped      {}  ({d})", repo.display()),
                ClearResult::Failed(d) => println!("error        {}  {d}", repo.display()),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} repositories could not be cleared");
    }
    Ok(())
}
