//! Codebase index written to `.agent/scan.json`

use crate::error::Result;
use crate::monitor::PathFilter;
use crate::monitor::filter::dotted_extension;
use crate::monitor::snapshot::read_content;
use crate::rules::AnalyzerRegistry;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Outline counts for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub path: String,
    pub lines: usize,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub total_files: usize,
    pub total_lines: usize,
    pub total_functions: usize,
    pub total_classes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebaseIndex {
    pub scanned_at: DateTime<Local>,
    pub files: Vec<IndexedFile>,
    pub summary: IndexSummary,
}

impl CodebaseIndex {
    /// Index every in-scope file under `root` that has an allow-listed extension
    pub fn build(root: &Path, filter: &PathFilter, analyzers: &AnalyzerRegistry) -> Self {
        let mut files = Vec::new();
        let mut summary = IndexSummary::default();

        for path in filter.walk(root) {
            // Extension-less files are tracked by the watcher but not indexed
            let Some(extension) = dotted_extension(&path) else {
                continue;
            };

            let content = read_content(&path);
            let outline = analyzers.for_extension(Some(&extension)).outline(&content).unwrap_or_default();

            let file = IndexedFile {
                path: path.strip_prefix(root).unwrap_or(&path).to_string_lossy().to_string(),
                lines: content.lines().count(),
                functions: outline.functions().map(|f| f.name.clone()).collect(),
                classes: outline.classes().map(|c| c.name.clone()).collect(),
                imports: outline.imports().map(|i| i.module.clone()).collect(),
            };

            summary.total_files += 1;
            summary.total_lines += file.lines;
            summary.total_functions += file.functions.len();
            summary.total_classes += file.classes.len();
            files.push(file);
        }

        Self {
            scanned_at: Local::now(),
            files,
            summary,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Indexed {} files into {}", self.summary.total_files, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_and_persist_index() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("models.py"), "import os\n\nclass User:\n    def name(self):\n        return 'x'\n").unwrap();
        fs::write(root.join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        fs::write(root.join("Makefile"), "all:\n").unwrap();

        let filter = PathFilter::new(Vec::new(), vec![".py".to_string(), ".go".to_string()]);
        let index = CodebaseIndex::build(root, &filter, &AnalyzerRegistry::default());

        assert_eq!(index.summary.total_files, 2);
        assert_eq!(index.summary.total_lines, 8);
        assert_eq!(index.summary.total_functions, 1);
        assert_eq!(index.summary.total_classes, 1);
        assert_eq!(index.files[1].path, "models.py");
        assert_eq!(index.files[1].imports, vec!["os".to_string()]);

        let scan_file = root.join("scan.json");
        index.write(&scan_file).unwrap();
        assert_eq!(CodebaseIndex::load(&scan_file).unwrap(), index);
    }
}
