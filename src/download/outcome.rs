//! Work and result types that flow through the worker pool.

use std::fmt;
use std::path::PathBuf;

use super::DownloadError;

/// A single URL to download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// Wraps a URL string. Validation happens when the target is fetched.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Unit of work handed to exactly one worker.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// Position of the unit in dispatch order, used for log correlation.
    pub id: usize,
    /// Targets processed in sequence by the worker that takes this unit.
    pub targets: Vec<Target>,
}

impl WorkUnit {
    /// Creates a unit holding a single target.
    #[must_use]
    pub fn single(id: usize, target: Target) -> Self {
        Self {
            id,
            targets: vec![target],
        }
    }
}

/// Final per-target result.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// The target this outcome belongs to.
    pub target: Target,
    /// Success or failure with a typed cause.
    pub status: OutcomeStatus,
}

/// Tagged result of one target's fetch and write.
#[derive(Debug)]
pub enum OutcomeStatus {
    /// File fully written.
    Succeeded {
        /// Where the file was written.
        path: PathBuf,
        /// Bytes written to the file.
        bytes_written: u64,
    },
    /// Any stage failed.
    Failed {
        /// Why the target failed.
        cause: DownloadError,
    },
}

impl DownloadOutcome {
    /// Creates a success outcome.
    #[must_use]
    pub fn succeeded(target: Target, path: PathBuf, bytes_written: u64) -> Self {
        Self {
            target,
            status: OutcomeStatus::Succeeded {
                path,
                bytes_written,
            },
        }
    }

    /// Creates a failure outcome.
    #[must_use]
    pub fn failed(target: Target, cause: DownloadError) -> Self {
        Self {
            target,
            status: OutcomeStatus::Failed { cause },
        }
    }

    /// Returns true for success outcomes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }

    /// Bytes that reached disk, including partial writes of failed copies.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        match &self.status {
            OutcomeStatus::Succeeded { bytes_written, .. } => *bytes_written,
            OutcomeStatus::Failed { cause } => cause.bytes_written(),
        }
    }

    /// Returns the failure cause, if any.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match &self.status {
            OutcomeStatus::Succeeded { .. } => None,
            OutcomeStatus::Failed { cause } => Some(cause),
        }
    }
}

/// A target that failed, with its cause.
#[derive(Debug)]
pub struct FailedTarget {
    /// The target that failed.
    pub target: Target,
    /// Why it failed.
    pub cause: DownloadError,
}

/// A target that was written to disk.
#[derive(Debug, Clone)]
pub struct CompletedTarget {
    /// The target that completed.
    pub target: Target,
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes_written: u64,
}

/// Aggregate result of one dispatch cycle.
#[derive(Debug, Default)]
pub struct RunSummary {
    completed: Vec<CompletedTarget>,
    failed: Vec<FailedTarget>,
    bytes_written: u64,
}

impl RunSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome into the summary, taking ownership of it.
    pub fn record(&mut self, outcome: DownloadOutcome) {
        self.bytes_written = self.bytes_written.saturating_add(outcome.bytes_written());
        match outcome.status {
            OutcomeStatus::Succeeded {
                path,
                bytes_written,
            } => self.completed.push(CompletedTarget {
                target: outcome.target,
                path,
                bytes_written,
            }),
            OutcomeStatus::Failed { cause } => self.failed.push(FailedTarget {
                target: outcome.target,
                cause,
            }),
        }
    }

    /// Number of targets written successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.completed.len()
    }

    /// Number of targets that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    /// Total outcomes recorded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Returns true when no outcome was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Bytes written across all targets, including partial files.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Successful targets in arrival order.
    #[must_use]
    pub fn completed_targets(&self) -> &[CompletedTarget] {
        &self.completed
    }

    /// Failed targets with causes, in arrival order.
    #[must_use]
    pub fn failed_targets(&self) -> &[FailedTarget] {
        &self.failed
    }

    /// Looks up the failure recorded for a URL.
    #[must_use]
    pub fn failure_for(&self, url: &str) -> Option<&DownloadError> {
        self.failed
            .iter()
            .find(|failed| failed.target.url() == url)
            .map(|failed| &failed.cause)
    }
}
