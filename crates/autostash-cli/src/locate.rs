use anyhow::Context;
use autostash_core::paths;
use std::path::PathBuf;

/// Files every command works against.
#[derive(Debug, Clone)]
pub struct Locations {
    pub trackfile: PathBuf,
    pub config: PathBuf,
}

impl Locations {
    /// Resolve file locations.
    ///
    /// Priority:
    /// 1. `--trackfile` / `--config` flags or their env vars (passed in as `explicit_*`)
    /// 2. The per-platform config directory
    pub fn resolve(
        explicit_trackfile: Option<PathBuf>,
        explicit_config: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let trackfile = match explicit_trackfile {
            Some(p) => p,
            None => paths::default_trackfile().context("cannot locate default tracklist")?,
        };
        let config = match explicit_config {
            Some(p) => p,
            None => paths::default_config_path().context("cannot locate default config")?,
        };
        Ok(Self { trackfile, config })
    }
}
