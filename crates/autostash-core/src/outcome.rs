use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Repository label used for failures of the tick loop itself rather than
/// of any single repository.
pub const RUN_LEVEL_REPO: &str = "<run>";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Stashed,
    NoChanges,
    Skipped,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Stashed => "STASHED",
            Status::NoChanges => "NO_CHANGES",
            Status::Skipped => "SKIPPED",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What happened to one repository on one tick. Each variant carries exactly
/// the fields that status is allowed to have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Stashed { stash_id: String, message: String },
    NoChanges,
    Skipped { detail: String },
    Error { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub repo: String,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl Outcome {
    pub fn stashed(repo: &Path, stash_id: String, message: String) -> Self {
        Self::new(repo, OutcomeKind::Stashed { stash_id, message })
    }

    pub fn no_changes(repo: &Path) -> Self {
        Self::new(repo, OutcomeKind::NoChanges)
    }

    pub fn skipped(repo: &Path, detail: impl Into<String>) -> Self {
        Self::new(
            repo,
            OutcomeKind::Skipped {
                detail: detail.into(),
            },
        )
    }

    pub fn error(repo: &Path, detail: impl Into<String>) -> Self {
        Self::new(
            repo,
            OutcomeKind::Error {
                detail: detail.into(),
            },
        )
    }

    /// Synthetic outcome for a failure of the tick loop itself.
    pub fn run_level(detail: impl Into<String>) -> Self {
        Self::error(Path::new(RUN_LEVEL_REPO), detail)
    }

    fn new(repo: &Path, kind: OutcomeKind) -> Self {
        Self {
            repo: repo.to_string_lossy().into_owned(),
            kind,
        }
    }

    pub fn status(&self) -> Status {
        match self.kind {
            OutcomeKind::Stashed { .. } => Status::Stashed,
            OutcomeKind::NoChanges => Status::NoChanges,
            OutcomeKind::Skipped { .. } => Status::Skipped,
            OutcomeKind::Error { .. } => Status::Error,
        }
    }

    pub fn stash_id(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Stashed { stash_id, .. } => Some(stash_id),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Stashed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Skipped { detail } | OutcomeKind::Error { detail } => Some(detail),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One pass over the tracklist.
#[derive(Debug, Clone)]
pub struct Tick {
    /// 1-based run counter.
    pub index: u64,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    /// `None` when no further run is scheduled (single-shot mode).
    pub next_run: Option<DateTime<Local>>,
    pub outcomes: Vec<Outcome>,
}

impl Tick {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub repos: usize,
    pub stashed: usize,
    pub no_changes: usize,
    pub skipped: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut s = Summary {
            repos: outcomes.len(),
            ..Summary::default()
        };
        for o in outcomes {
            match o.status() {
                Status::Stashed => s.stashed += 1,
                Status::NoChanges => s.no_changes += 1,
                Status::Skipped => s.skipped += 1,
                Status::Error => s.error += 1,
            }
        }
        s
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "repos={} stashed={} no_changes={} skipped={} error={}",
            self.repos, self.stashed, self.no_changes, self.skipped, self.error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_follow_status() {
        let repo = Path::new("/repo");
        let stashed = Outcome::stashed(repo, "abc".into(), "auto-stash x".into());
        assert_eq!(stashed.status(), Status::Stashed);
        assert_eq!(stashed.stash_id(), Some("abc"));
        assert_eq!(stashed.detail(), None);

        let skipped = Outcome::skipped(repo, "not a git repository");
        assert_eq!(skipped.stash_id(), None);
        assert_eq!(skipped.message(), None);
        assert_eq!(skipped.detail(), Some("not a git repository"));

        let clean = Outcome::no_changes(repo);
        assert_eq!(clean.detail(), None);
        assert_eq!(clean.message(), None);
    }

    #[test]
    fn run_level_uses_sentinel_repo() {
        let o = Outcome::run_level("boom");
        assert_eq!(o.repo, RUN_LEVEL_REPO);
        assert_eq!(o.status(), Status::Error);
    }

    #[test]
    fn summary_counts_each_status() {
        let outcomes = vec![
            Outcome::stashed(Path::new("/a"), "1".into(), "m".into()),
            Outcome::no_changes(Path::new("/b")),
            Outcome::skipped(Path::new("/c"), "not a git repository"),
        ];
        let s = Summary::from_outcomes(&outcomes);
        assert_eq!(s.to_string(), "repos=3 stashed=1 no_changes=1 skipped=1 error=0");
    }

    #[test]
    fn serializes_with_status_tag() {
        let o = Outcome::skipped(Path::new("/c"), "not a git repository");
        let yaml = serde_yaml::to_string(&o).unwrap();
        assert!(yaml.contains("status: SKIPPED"));
        assert!(yaml.contains("detail: not a git repository"));
        assert!(!yaml.contains("stash_id"));
    }
}
