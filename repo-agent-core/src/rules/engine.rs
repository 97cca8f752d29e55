//! Per-file rule evaluation

use super::analyzer::{AnalyzerRegistry, OutlineItem};
use super::{Finding, FindingType, RuleSet};
use crate::error::AgentError;
use crate::monitor::filter::dotted_extension;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Evaluates files against one loaded rule set
pub struct RuleEngine {
    rules: RuleSet,
    patterns: Vec<(Regex, String)>,
    analyzers: AnalyzerRegistry,
}

impl RuleEngine {
    /// Compile the rule set. Invalid patterns are skipped with a warning.
    pub fn new(rules: RuleSet) -> Self {
        Self::with_analyzers(rules, AnalyzerRegistry::default())
    }

    pub fn with_analyzers(rules: RuleSet, analyzers: AnalyzerRegistry) -> Self {
        let patterns = rules
            .forbidden_patterns
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(regex) => Some((regex, rule.message.clone())),
                Err(source) => {
                    let err = AgentError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    };
                    warn!("{}; skipping", err);
                    None
                }
            })
            .collect();

        Self {
            rules,
            patterns,
            analyzers,
        }
    }

    /// Read and evaluate a file. An unreadable file yields a single ERROR.
    pub fn check_file(&self, path: &Path) -> Vec<Finding> {
        let file = path.to_string_lossy().to_string();
        let mut findings = self.filename_findings(path, &file);

        match std::fs::read_to_string(path) {
            Ok(content) => findings.extend(self.content_findings(path, &file, &content)),
            Err(e) => findings.push(Finding::new(file, FindingType::Error, format!("Could not read file: {}", e))),
        }
        findings
    }

    /// Evaluate already-loaded content
    pub fn evaluate(&self, path: &Path, content: &str) -> Vec<Finding> {
        let file = path.to_string_lossy().to_string();
        let mut findings = self.filename_findings(path, &file);
        findings.extend(self.content_findings(path, &file, content));
        findings
    }

    fn filename_findings(&self, path: &Path, file: &str) -> Vec<Finding> {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if self.rules.forbidden_files.iter().any(|forbidden| *forbidden == name) {
            vec![Finding::new(file, FindingType::ForbiddenFile, format!("Forbidden file: {}", name))]
        } else {
            Vec::new()
        }
    }

    fn content_findings(&self, path: &Path, file: &str, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        let line_count = content.lines().count();
        if line_count > self.rules.max_file_lines {
            findings.push(Finding::new(
                file,
                FindingType::FileTooLong,
                format!("File has {} lines (max {})", line_count, self.rules.max_file_lines),
            ));
        }

        for (index, line) in content.lines().enumerate() {
            for (regex, message) in &self.patterns {
                if regex.is_match(line) {
                    findings.push(Finding::new(
                        file,
                        FindingType::ForbiddenPattern,
                        format!("Line {}: {}", index + 1, message),
                    ));
                }
            }
        }

        findings.extend(self.language_findings(path, file, content));
        findings
    }

    fn language_findings(&self, path: &Path, file: &str, content: &str) -> Vec<Finding> {
        let extension = dotted_extension(path);
        let analyzer = self.analyzers.for_extension(extension.as_deref());
        let Some(outline) = analyzer.outline(content) else {
            return Vec::new();
        };

        let mut findings = Vec::new();
        for item in &outline.items {
            match item {
                OutlineItem::Import(import) => {
                    let name = import.checked_name();
                    if self.rules.forbidden_imports.iter().any(|f| f == name) {
                        findings.push(Finding::new(
                            file,
                            FindingType::ForbiddenImport,
                            format!("Line {}: Forbidden import '{}'", import.line, name),
                        ));
                    }
                }
                OutlineItem::Function(function) => {
                    let length = function.line_count();
                    if length > self.rules.max_function_lines {
                        findings.push(Finding::new(
                            file,
                            FindingType::FunctionTooLong,
                            format!(
                                "Function '{}' is {} lines (max {})",
                                function.name, length, self.rules.max_function_lines
                            ),
                        ));
                    }
                }
                OutlineItem::Class(_) => {}
            }
        }
        findings
    }
}
