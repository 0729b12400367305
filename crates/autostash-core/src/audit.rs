use crate::error::Result;
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

/// `[YYYY-MM-DD HH:MM:SS]`
pub fn timestamp(at: DateTime<Local>) -> String {
    format!("[{}]", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Append-only, timestamped audit trail.
///
/// Construct once with [`AuditLog::init`] at startup; appends never create
/// directories.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `lines`, each prefixed with the timestamp for `at`, in one write.
    pub fn append<S: AsRef<str>>(&self, at: DateTime<Local>, lines: &[S]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let stamp = timestamp(at);
        let mut buf = String::new();
        for line in lines {
            buf.push_str(&stamp);
            buf.push(' ');
            buf.push_str(line.as_ref());
            buf.push('\n');
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        Ok(())
    }
}
