use crate::error::{Result, StashError};
use crate::paths;
use crate::persist::replace_file;
use crate::report::Format;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INTERVAL_SECS: u64 = 20;

/// One day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Keys accepted by [`Config::set`].
pub const KEYS: &[&str] = &["interval_secs", "include_untracked", "format", "log_file"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Shared by change detection and capture.
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default)]
    pub format: Format,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            include_untracked: false,
            format: Format::default(),
            log_file: None,
        }
    }
}

/// Accept `1..=MAX_INTERVAL_SECS`.
pub fn check_interval(secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(StashError::InvalidConfig(
            "interval_secs must be at least 1".to_string(),
        ));
    }
    if secs > MAX_INTERVAL_SECS {
        return Err(StashError::InvalidConfig(format!(
            "interval_secs must be at most {MAX_INTERVAL_SECS} (one day), got {secs}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load from `path`; a missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let data = serde_yaml::to_string(self)?;
        replace_file(path, &data)
    }

    /// Write the defaults to `path` unless a file is already there. Returns
    /// whether anything was written.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        check_interval(self.interval_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Configured audit log location, or the per-platform default.
    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(p) => Ok(p.clone()),
            None => paths::default_log_path(),
        }
    }

    /// Update one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "interval_secs" => {
                self.interval_secs = value.parse().map_err(|_| {
                    StashError::InvalidConfig(format!("interval_secs: '{value}' is not a number"))
                })?;
            }
            "include_untracked" => {
                self.include_untracked = value.parse().map_err(|_| {
                    StashError::InvalidConfig(format!(
                        "include_untracked: '{value}' is not true/false"
                    ))
                })?;
            }
            "format" => self.format = value.parse()?,
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(paths::normalize_path(value)?)
                };
            }
            other => {
                return Err(StashError::InvalidConfig(format!(
                    "unknown key '{other}'; valid: {}",
                    KEYS.join(", ")
                )))
            }
        }
        self.validate()
    }
}
