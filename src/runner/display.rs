use crate::runner::executor::TestRunResult;
use crate::runner::result::{CaseResult, CaseStatus};

/// Format a status label for terminal output.
fn status_label(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Passed => "PASSED",
        CaseStatus::Failed => "FAILED",
        CaseStatus::Skipped => "SKIPPED",
        CaseStatus::Error => "ERROR",
    }
}

/// Format a case result as it completes.
pub fn format_case_result(result: &CaseResult, verbose: bool) -> String {
    let status = status_label(result.status);
    let duration_secs = result.duration.as_secs_f64();
    let mut line = format!("  [{status}] {} ({:.1}s)", result.case, duration_secs);

    if result.status.is_failure()
        && let Some(err) = &result.error
    {
        line.push_str(&format!("\n         → {}", err.message));
        if verbose && let Some(detail) = &err.detail {
            for detail_line in detail.lines() {
                line.push_str(&format!("\n           {detail_line}"));
            }
        }
    }

    if let Some(reason) = &result.reason {
        line.push_str(&format!("\n         → {reason}"));
    }

    line
}

/// Format the closing summary: counts per status across the chains run,
/// then the homes that failed or erred, one per line, ready to be saved as
/// a `--load-list` file.
pub fn format_summary(result: &TestRunResult) -> String {
    let summary = &result.summary;
    let tally: Vec<String> = [
        (summary.passed, "passed"),
        (summary.failed, "failed"),
        (summary.skipped, "skipped"),
        (summary.errors, "errors"),
    ]
    .into_iter()
    .filter(|&(count, _)| count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();
    let tally = if tally.is_empty() {
        "nothing ran".to_owned()
    } else {
        tally.join(", ")
    };

    let mut out = format!(
        "\nResults: {} case(s) in {} chain(s): {tally} ({:.1}s)",
        summary.total,
        result.chains,
        result.total_duration.as_secs_f64()
    );

    let failing: Vec<&str> = result
        .cases
        .iter()
        .filter(|case| case.status.is_failure())
        .map(|case| case.case.as_str())
        .collect();
    if !failing.is_empty() {
        out.push_str("\nFailing cases:");
        for home in failing {
            out.push_str(&format!("\n{home}"));
        }
    }
    out
}

/// Format the run header line.
pub fn format_run_header(cases: usize, backend: &str) -> String {
    format!("Running {cases} test(s) ({backend} backend)...\n")
}
