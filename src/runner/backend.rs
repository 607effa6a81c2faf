use std::fmt;

use crate::plan::TestCase;
use crate::runner::context::RunContext;
use crate::runner::result::CaseResult;

/// Something that knows how to execute a case.
///
/// The runner decides *whether* a case runs (enabled, dependencies,
/// fail-fast); a backend only decides *how*.
pub trait CaseBackend: Send + Sync {
    /// Human-readable backend name (e.g., "shell").
    fn name(&self) -> &str;

    /// Execute one case.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the case could not be started at all.
    /// A case that runs and fails is not an error: it produces a
    /// [`CaseResult`] with `CaseStatus::Failed`.
    fn execute_case(&self, case: &TestCase, context: &RunContext)
    -> Result<CaseResult, BackendError>;
}

/// Errors from backend operations.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Classification of backend errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Nothing is registered to run for the case.
    ActionNotFound,
    /// The case's code or process could not be started.
    ExecutionFailed,
    /// The case needs something this backend does not provide.
    UnsupportedFeature,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionNotFound => write!(f, "action not found"),
            Self::ExecutionFailed => write!(f, "execution failed"),
            Self::UnsupportedFeature => write!(f, "unsupported feature"),
        }
    }
}
