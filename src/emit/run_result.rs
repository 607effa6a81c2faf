use std::fmt::Write;

use crate::emit::util::{class_of, xml_escape};
use crate::runner::report::TestRunReport;

const SUITE_NAME: &str = "tether";

/// Emit test run results as YAML.
pub fn emit_run_yaml(report: &TestRunReport) -> String {
    serde_yaml::to_string(report).unwrap_or_else(|e| format!("# Error serializing report: {e}"))
}

/// Emit test run results as JSON.
pub fn emit_run_json(report: &TestRunReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{ \"error\": \"{e}\" }}"))
}

/// Emit test run results as JUnit XML.
///
/// Method cases are grouped under their class through `classname`; free
/// functions use the suite name.
pub fn emit_run_junit(report: &TestRunReport) -> String {
    let mut out = String::new();
    let tests = report.summary.total;
    let failures = report.summary.failed;
    let errors = report.summary.errors;
    let skipped = report.summary.skipped;
    let time_secs = report.run.duration_ms as f64 / 1000.0;

    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<testsuites name="{SUITE_NAME}" tests="{tests}" failures="{failures}" errors="{errors}" time="{time_secs:.1}">"#
    );
    let _ = writeln!(
        out,
        r#"  <testsuite name="{SUITE_NAME}" tests="{tests}" failures="{failures}" errors="{errors}" skipped="{skipped}" time="{time_secs:.1}">"#
    );

    for case in &report.results {
        let name = xml_escape(&case.case);
        let classname = xml_escape(class_of(&case.case).unwrap_or(SUITE_NAME));
        let case_time = case.duration_ms as f64 / 1000.0;
        let _ = writeln!(
            out,
            r#"    <testcase name="{name}" classname="{classname}" time="{case_time:.1}">"#
        );

        match case.status.as_str() {
            "failed" => match &case.error {
                Some(err) => {
                    let _ = writeln!(
                        out,
                        r#"      <failure message="{}" type="{}"/>"#,
                        xml_escape(&err.message),
                        xml_escape(&err.kind)
                    );
                }
                None => {
                    let _ = writeln!(out, r#"      <failure message="test failed"/>"#);
                }
            },
            "error" => match &case.error {
                Some(err) => {
                    let _ = writeln!(
                        out,
                        r#"      <error message="{}" type="{}"/>"#,
                        xml_escape(&err.message),
                        xml_escape(&err.kind)
                    );
                }
                None => {
                    let _ = writeln!(out, r#"      <error message="execution error"/>"#);
                }
            },
            "skipped" => match &case.reason {
                Some(reason) => {
                    let _ = writeln!(out, r#"      <skipped message="{}"/>"#, xml_escape(reason));
                }
                None => {
                    let _ = writeln!(out, "      <skipped/>");
                }
            },
            _ => {}
        }

        if let Some(detail) = case.error.as_ref().and_then(|e| e.detail.as_ref()) {
            let _ = writeln!(out, "      <system-err>{}</system-err>", xml_escape(detail));
        }

        let _ = writeln!(out, "    </testcase>");
    }

    let _ = writeln!(out, "  </testsuite>");
    let _ = writeln!(out, "</testsuites>");

    out
}
