//! The persisted set of working trees to watch.
//!
//! Plain UTF-8, one absolute path per line. Blank lines and `#` comments are
//! ignored on load; saving rewrites the file sorted and de-duplicated through
//! [`crate::persist::replace_file`].

use crate::error::Result;
use crate::persist::replace_file;
use crate::paths::normalize_path;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

const HEADER: &str = "# GitAutoStash track list\n\
# One directory per line; ~ and $VARS are expanded, lines starting with # are ignored.\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddResult {
    Added(PathBuf),
    AlreadyExists(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveResult {
    Removed(PathBuf),
    NotFound(PathBuf),
}

impl fmt::Display for AddResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddResult::Added(p) => write!(f, "Added: {}", p.display()),
            AddResult::AlreadyExists(p) => write!(f, "Already exists: {}", p.display()),
        }
    }
}

impl fmt::Display for RemoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveResult::Removed(p) => write!(f, "Removed: {}", p.display()),
            RemoveResult::NotFound(p) => write!(f, "Not found: {}", p.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tracklist {
    path: PathBuf,
    items: Vec<PathBuf>,
}

impl Tracklist {
    /// Load the tracklist at `path`. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                items: Vec::new(),
            });
        }
        let data = std::fs::read_to_string(path)?;
        let mut items = Vec::new();
        let mut seen = BTreeSet::new();
        for raw in data.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let norm = normalize_path(line)?;
            if seen.insert(norm.clone()) {
                items.push(norm);
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn save(&self) -> Result<()> {
        let sorted: BTreeSet<&PathBuf> = self.items.iter().collect();
        let mut data = String::from(HEADER);
        for p in sorted {
            data.push_str(&p.to_string_lossy());
            data.push('\n');
        }
        replace_file(&self.path, &data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracked paths in file order.
    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.items.iter().any(|p| p == path)
    }
}

/// Load, append `raw` (normalized) and save. Duplicates are a no-op.
pub fn add(trackfile: &Path, raw: &str) -> Result<AddResult> {
    let mut list = Tracklist::load(trackfile)?;
    let norm = normalize_path(raw)?;
    if list.contains(&norm) {
        return Ok(AddResult::AlreadyExists(norm));
    }
    list.items.push(norm.clone());
    list.save()?;
    Ok(AddResult::Added(norm))
}

/// Load, drop `raw` (normalized) and save. Unknown paths leave the file untouched.
pub fn remove(trackfile: &Path, raw: &str) -> Result<RemoveResult> {
    let mut list = Tracklist::load(trackfile)?;
    let norm = normalize_path(raw)?;
    let before = list.items.len();
    list.items.retain(|p| p != &norm);
    if list.items.len() == before {
        return Ok(RemoveResult::NotFound(norm));
    }
    list.save()?;
    Ok(RemoveResult::Removed(norm))
}
