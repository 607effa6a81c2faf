use std::fmt::Write;

use crate::plan::{TestCase, TestPlan};

pub const PLAN_HEADER: &str = "   *  *  *  Test Plan  *  *  *";

/// Describe one case: its home, its description if any, then one
/// tab-indented line per metadata field.
pub fn write_doc(out: &mut String, case: &TestCase) {
    let entry = case.entry();
    let _ = writeln!(out, "{}", case.label());
    if let Some(description) = &entry.info().description {
        let _ = writeln!(out, "{description}");
    }
    for field in entry.info().field_lines() {
        let _ = writeln!(out, "\t{field}");
    }
}

/// Render the whole plan in run order, as printed by `--show-plan`.
pub fn show_plan(plan: &TestPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{PLAN_HEADER}");
    for case in plan.tests() {
        write_doc(&mut out, case);
    }
    out
}
