//! `scan`: write the codebase index

use anyhow::{Context, Result};
use repo_agent_core::index::CodebaseIndex;
use repo_agent_core::rules::AnalyzerRegistry;
use std::path::Path;

pub fn execute(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    paths.require_initialized()?;

    let filter = super::path_filter(&paths);
    let index = CodebaseIndex::build(&paths.root, &filter, &AnalyzerRegistry::default());
    index
        .write(&paths.scan_file)
        .with_context(|| format!("Failed to write {}", paths.scan_file.display()))?;

    let summary = &index.summary;
    println!("Scanned {} files", summary.total_files);
    println!("  Lines:     {}", summary.total_lines);
    println!("  Functions: {}", summary.total_functions);
    println!("  Classes:   {}", summary.total_classes);
    println!("Index written to {}", paths.scan_file.display());
    Ok(())
}
