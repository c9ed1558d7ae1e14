//! Per-origin outcomes and the aggregated run report.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use gsmc_registry::PlatformSupport;

use crate::deps::Satisfaction;
use crate::error::PackError;

/// What the run does with each source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Download missing artifacts.
    Sync,
    /// Check that every artifact is reachable.
    Test,
    /// Check peer dependencies.
    Dep,
}

impl Action {
    /// Past tense used in the summary line.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Sync => "synced",
            Self::Test => "passed",
            Self::Dep => "satisfied",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "sync",
            Self::Test => "test",
            Self::Dep => "dep",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Assumed,
    Exists(PathBuf),
    /// `nosync` / `notest` flag.
    Flagged,
    /// An earlier origin already claimed the label.
    Duplicate,
    /// An earlier source of the run writes to the same path.
    SharedTarget { path: PathBuf, owner: String },
    /// The action has no meaning for this kind of source.
    NotApplicable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assumed => f.write_str("assumed present"),
            Self::Exists(path) => write!(f, "{} exists", path.display()),
            Self::Flagged => f.write_str("disabled by flag"),
            Self::Duplicate => f.write_str("duplicate label"),
            Self::SharedTarget { path, owner } => {
                write!(f, "{} already claimed by '{}'", path.display(), owner)
            }
            Self::NotApplicable => f.write_str("not applicable"),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Synced { path: PathBuf, size_mib: f64 },
    Passed { status: u16 },
    Checked(Satisfaction),
    Skipped(SkipReason),
    Failed {
        error: PackError,
        /// Supported game versions per loader, when requested.
        nearest: Vec<PlatformSupport>,
    },
}

impl Outcome {
    pub fn failed(error: PackError) -> Self {
        Self::Failed {
            error,
            nearest: Vec::new(),
        }
    }

    /// Skipped sources count as successful.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Synced { .. } | Self::Passed { .. } | Self::Skipped(_) => true,
            Self::Checked(satisfaction) => satisfaction.satisfied,
            Self::Failed { .. } => false,
        }
    }
}

/// Outcome for one origin of the run.
#[derive(Debug)]
pub struct Entry {
    pub origin: String,
    /// `None` when the origin could not be parsed.
    pub label: Option<String>,
    /// Added by peer expansion rather than the manifest.
    pub peer: bool,
    pub outcome: Outcome,
}

impl Entry {
    /// Duplicate label or target. These are diagnostics, not sources.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Skipped(SkipReason::Duplicate | SkipReason::SharedTarget { .. })
        )
    }
}

#[derive(Debug)]
pub struct Report {
    pub action: Action,
    pub entries: Vec<Entry>,
    /// Every label present in the run.
    pub labels: BTreeSet<String>,
    /// Incompatible peers whose own source completed in the run.
    pub conflicts: Vec<String>,
}

impl Report {
    /// Entries counted in the summary. Duplicates are diagnostics only.
    pub fn counted(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_duplicate())
    }

    pub fn total(&self) -> usize {
        self.counted().count()
    }

    pub fn succeeded(&self) -> usize {
        self.counted().filter(|e| e.outcome.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.outcome.is_success())
    }

    pub fn duplicates(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_duplicate())
    }

    /// `N / total <verb>`
    pub fn summary(&self) -> String {
        format!(
            "{} / {} {}",
            self.succeeded(),
            self.total(),
            self.action.verb()
        )
    }
}
