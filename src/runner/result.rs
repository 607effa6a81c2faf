use std::fmt;
use std::time::Duration;

/// The outcome of executing a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
    Error,
}

impl CaseStatus {
    /// Failed or errored; either one propagates to dependents.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of executing a single case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub case: String,
    pub status: CaseStatus,
    pub duration: Duration,
    pub error: Option<CaseError>,
    /// Why the case did not run, for skipped results.
    pub reason: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl CaseResult {
    fn new(case: &str, status: CaseStatus, duration: Duration) -> Self {
        Self {
            case: case.to_owned(),
            status,
            duration,
            error: None,
            reason: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn passed(case: &str, duration: Duration) -> Self {
        Self::new(case, CaseStatus::Passed, duration)
    }

    pub fn failed(case: &str, duration: Duration, error: CaseError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(case, CaseStatus::Failed, duration)
        }
    }

    /// The case could not be run properly (panic, missing action, ...).
    pub fn errored(case: &str, duration: Duration, error: CaseError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(case, CaseStatus::Error, duration)
        }
    }

    /// Create a skipped result with zero duration.
    pub fn skipped(case: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(case, CaseStatus::Skipped, Duration::ZERO)
        }
    }
}

/// Error detail for a failed or errored case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseError {
    pub kind: CaseErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl CaseError {
    pub fn new(kind: CaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Classification of case errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseErrorKind {
    /// The case ran and reported a failure.
    AssertionFailed,
    /// A shell command exited with a non-zero status.
    CommandFailed,
    /// The case panicked.
    Panicked,
    /// The backend could not run the case at all.
    BackendFailed,
}

impl fmt::Display for CaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssertionFailed => write!(f, "assertion failed"),
            Self::CommandFailed => write!(f, "command failed"),
            Self::Panicked => write!(f, "panicked"),
            Self::BackendFailed => write!(f, "backend failed"),
        }
    }
}
