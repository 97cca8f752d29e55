//! Plain-text compliance report
//!
//! The dashboard parses this text, so the marker lines are fixed:
//! `VIOLATIONS FOUND: n` / `No violations found.`, `ADVISORIES: n` /
//! `No advisories.`, `[file]` headers with `├── TYPE: message` lines, and
//! the closing `Files checked:` / `Passed:` / `Failed:` counts.

use super::{Finding, ScanSummary};
use std::fmt::Write;

const BRANCH: &str = "├── ";

pub fn render_report(summary: &ScanSummary) -> String {
    let mut out = String::new();

    let violations: Vec<&Finding> = summary.violations().collect();
    if violations.is_empty() {
        out.push_str("No violations found.\n");
    } else {
        let _ = writeln!(out, "VIOLATIONS FOUND: {}", violations.len());
        write_grouped(&mut out, &violations);
    }
    out.push('\n');

    let advisories: Vec<&Finding> = summary.advisories().collect();
    if advisories.is_empty() {
        out.push_str("No advisories.\n");
    } else {
        let _ = writeln!(out, "ADVISORIES: {}", advisories.len());
        write_grouped(&mut out, &advisories);
    }
    out.push('\n');

    let _ = writeln!(out, "Files checked: {}", summary.files_checked);
    let _ = writeln!(out, "Passed: {}", summary.files_passed);
    let _ = writeln!(out, "Failed: {}", summary.files_failed);
    out
}

/// Findings arrive grouped by file; emit one header per run of a file
fn write_grouped(out: &mut String, findings: &[&Finding]) {
    let mut current: Option<&str> = None;
    for finding in findings {
        if current != Some(finding.file.as_str()) {
            let _ = writeln!(out, "\n[{}]", finding.file);
            current = Some(finding.file.as_str());
        }
        let _ = writeln!(out, "  {}{}: {}", BRANCH, finding.finding_type, finding.message);
    }
}
