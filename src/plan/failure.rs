use std::fmt;

use tracing::debug;

use crate::plan::{CaseId, TestPlan};

/// Raised instead of running a case whose dependency failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub case: String,
    pub cause: String,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure in {}", self.cause)
    }
}

impl std::error::Error for Skip {}

impl TestPlan {
    /// Decide whether `id` may run given the failures recorded so far.
    ///
    /// `always_run` cases are never skipped, and a case's own failure does
    /// not count against it.
    ///
    /// # Errors
    ///
    /// Returns [`Skip`] naming the first failed case upstream of `id`.
    pub fn check_dependencies(&self, id: CaseId) -> Result<(), Skip> {
        let case = self.case(id);
        if case.entry().info().always_run {
            return Ok(());
        }
        match case.dependency_failure() {
            Some(cause) if cause != id => Err(Skip {
                case: case.label(),
                cause: self.case(cause).label(),
            }),
            _ => Ok(()),
        }
    }

    /// Record that `id` failed and mark its critical dependents, transitively.
    ///
    /// `cause` defaults to `id` itself. A case keeps the first cause it is
    /// given; later calls neither overwrite it nor walk past it.
    pub fn fail(&mut self, id: CaseId, cause: Option<CaseId>) {
        let cause = cause.unwrap_or(id);
        let mut pending = vec![id];
        let mut marked = 0usize;

        while let Some(current) = pending.pop() {
            let case = &mut self.cases[current.0];
            if case.dependency_failure.is_some() {
                continue;
            }
            case.dependency_failure = Some(cause);
            marked += 1;
            pending.extend(
                case.dependents
                    .iter()
                    .filter(|d| d.critical)
                    .map(|d| d.case),
            );
        }

        debug!(case = %self.case(id).label(), marked, "recorded failure");
    }
}
