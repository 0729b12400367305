use crate::error::{Result, StashError};
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File locations
// ---------------------------------------------------------------------------

pub const APP_NAME: &str = "GitAutoStash";
pub const APP_DIR: &str = "git-auto-stash";

pub const TRACKLIST_FILE: &str = "tracklist.txt";
pub const CONFIG_FILE: &str = "config.yaml";
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "auto_stash.log";

/// Per-platform configuration directory.
///
/// - Windows: `%APPDATA%\GitAutoStash`
/// - Others: `~/.config/git-auto-stash`
pub fn config_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        let base = match std::env::var_os("APPDATA") {
            Some(appdata) => PathBuf::from(appdata),
            None => home_dir()?.join("AppData").join("Roaming"),
        };
        return Ok(base.join(APP_NAME));
    }
    Ok(home_dir()?.join(".config").join(APP_DIR))
}

pub fn default_trackfile() -> Result<PathBuf> {
    Ok(config_dir()?.join(TRACKLIST_FILE))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(LOG_DIR).join(LOG_FILE))
}

fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(StashError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a user-supplied path into the canonical form stored in the
/// tracklist: `~` and `$VAR` / `${VAR}` expanded, made absolute against the
/// current directory, `.`/`..` collapsed and symlinks resolved when the
/// path exists.
pub fn normalize_path(raw: &str) -> Result<PathBuf> {
    let expanded = expand_vars(&expand_tilde(raw.trim())?);
    let path = PathBuf::from(expanded);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    match std::fs::canonicalize(&absolute) {
        Ok(resolved) => Ok(resolved),
        Err(_) => Ok(clean(&absolute)),
    }
}

fn expand_tilde(raw: &str) -> Result<String> {
    if raw == "~" {
        return Ok(home_dir()?.to_string_lossy().into_owned());
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(home_dir()?.join(rest).to_string_lossy().into_owned());
    }
    Ok(raw.to_string())
}

static VAR_RE: OnceLock<Regex> = OnceLock::new();

fn var_re() -> &'static Regex {
    VAR_RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").unwrap())
}

fn expand_vars(raw: &str) -> String {
    expand_vars_with(raw, |name| std::env::var(name).ok())
}

/// Unknown variables are left untouched.
fn expand_vars_with<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    var_re()
        .replace_all(raw, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Lexically collapse `.` and `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
