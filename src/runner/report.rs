use serde::{Deserialize, Serialize};

use crate::runner::executor::TestRunResult;

/// Serializable test run result for emitter output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRunReport {
    pub run: RunMetadata,
    pub results: Vec<CaseResultReport>,
    pub summary: SummaryReport,
}

/// Metadata about the run execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub backend: String,
    pub chains: usize,
    pub duration_ms: u64,
}

/// A single case's execution result in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResultReport {
    pub order: usize,
    pub case: String,
    pub status: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Error detail in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Summary statistics in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub success: bool,
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Convert a [`TestRunResult`] into a serializable [`TestRunReport`].
pub fn to_report(result: &TestRunResult) -> TestRunReport {
    let results = result
        .cases
        .iter()
        .enumerate()
        .map(|(i, case)| CaseResultReport {
            order: i + 1,
            case: case.case.clone(),
            status: case.status.to_string(),
            duration_ms: millis(case.duration),
            reason: case.reason.clone(),
            error: case.error.as_ref().map(|e| ErrorReport {
                kind: e.kind.to_string(),
                message: e.message.clone(),
                detail: e.detail.clone(),
            }),
        })
        .collect();

    TestRunReport {
        run: RunMetadata {
            backend: result.backend.clone(),
            chains: result.chains,
            duration_ms: millis(result.total_duration),
        },
        results,
        summary: SummaryReport {
            total: result.summary.total,
            passed: result.summary.passed,
            failed: result.summary.failed,
            skipped: result.summary.skipped,
            errors: result.summary.errors,
            success: result.summary.success(),
        },
    }
}
