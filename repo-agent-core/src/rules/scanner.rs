//! Whole-tree compliance scans

use super::{Finding, RuleEngine};
use crate::monitor::PathFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Findings of one file, in evaluation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub findings: Vec<Finding>,
}

impl FileReport {
    pub fn has_violations(&self) -> bool {
        self.findings.iter().any(Finding::is_violation)
    }
}

/// Result of one scan. Only files with findings are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub files_checked: usize,
    pub files_passed: usize,
    pub files_failed: usize,
    pub files: Vec<FileReport>,
}

impl ScanSummary {
    pub fn violations(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter()).filter(|f| f.is_violation())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter()).filter(|f| !f.is_violation())
    }
}

pub struct ComplianceScanner<'a> {
    engine: &'a RuleEngine,
    filter: &'a PathFilter,
}

impl<'a> ComplianceScanner<'a> {
    pub fn new(engine: &'a RuleEngine, filter: &'a PathFilter) -> Self {
        Self { engine, filter }
    }

    /// Check every in-scope file under `root` in name order
    pub fn scan(&self, root: &Path) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for path in self.filter.walk(root) {
            let findings = self.engine.check_file(&path);
            summary.files_checked += 1;

            let report = FileReport {
                file: path.to_string_lossy().to_string(),
                findings,
            };
            if report.has_violations() {
                summary.files_failed += 1;
            } else {
                summary.files_passed += 1;
            }
            if report.findings.is_empty() {
                debug!("{} passed", report.file);
            } else {
                summary.files.push(report);
            }
        }

        info!(
            "Checked {} files: {} passed, {} failed",
            summary.files_checked, summary.files_passed, summary.files_failed
        );
        summary
    }
}
