//! Compliance rules: configuration, per-file evaluation and tree scans

pub mod analyzer;
pub mod engine;
pub mod report;
pub mod scanner;

pub use analyzer::{AnalyzerRegistry, LanguageAnalyzer, NoopAnalyzer, PythonAnalyzer, SourceOutline};
pub use engine::RuleEngine;
pub use report::render_report;
pub use scanner::{ComplianceScanner, FileReport, ScanSummary};

use crate::config::{AgentPaths, load_yaml_or};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A regex applied to every line, with the message reported on match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub message: String,
}

impl PatternRule {
    pub fn new(pattern: &str, message: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }
}

/// Contents of `rules.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub max_function_lines: usize,
    pub max_file_lines: usize,
    pub forbidden_imports: Vec<String>,
    /// Exact basenames
    pub forbidden_files: Vec<String>,
    pub forbidden_patterns: Vec<PatternRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_function_lines: 50,
            max_file_lines: 800,
            forbidden_imports: vec!["sqlite3".to_string(), "pickle".to_string()],
            forbidden_files: vec!["server.py".to_string(), ".env.production".to_string()],
            forbidden_patterns: vec![
                PatternRule::new(
                    r#"(?i)\b(password|passwd|secret|api_key|apikey|access_token|auth_token)\b\s*[:=]\s*["'][^"']+["']"#,
                    "Hardcoded credential detected",
                ),
                PatternRule::new(r"\beval\(", "Use of eval() is forbidden"),
            ],
        }
    }
}

/// Load `rules.yaml`, falling back to defaults when absent or malformed
pub fn load_rules(paths: &AgentPaths) -> RuleSet {
    load_yaml_or(&paths.rules_file, RuleSet::default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Violation,
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    ForbiddenFile,
    Error,
    FileTooLong,
    ForbiddenPattern,
    ForbiddenImport,
    FunctionTooLong,
}

impl FindingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingType::ForbiddenFile => "FORBIDDEN_FILE",
            FindingType::Error => "ERROR",
            FindingType::FileTooLong => "FILE_TOO_LONG",
            FindingType::ForbiddenPattern => "FORBIDDEN_PATTERN",
            FindingType::ForbiddenImport => "FORBIDDEN_IMPORT",
            FindingType::FunctionTooLong => "FUNCTION_TOO_LONG",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingType::FileTooLong | FindingType::FunctionTooLong => Severity::Advisory,
            _ => Severity::Violation,
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(file: impl Into<String>, finding_type: FindingType, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            finding_type,
            severity: finding_type.severity(),
            message: message.into(),
        }
    }

    pub fn is_violation(&self) -> bool {
        self.severity == Severity::Violation
    }
}
