//! `check`: run the compliance scanner over the tree

use crate::cli::app::CheckArgs;
use anyhow::{Context, Result};
use repo_agent_core::rules::{ComplianceScanner, RuleEngine, load_rules, render_report};
use std::path::Path;
use tracing::info;

/// Findings never change the exit code
pub fn execute(root: &Path, args: CheckArgs) -> Result<()> {
    let paths = super::agent_paths(root);
    let filter = super::path_filter(&paths);
    let engine = RuleEngine::new(load_rules(&paths));

    info!("Checking {}", paths.root.display());
    let summary = ComplianceScanner::new(&engine, &filter).scan(&paths.root);

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize check results")?;
        println!("{}", json);
    } else {
        print!("{}", render_report(&summary));
    }
    Ok(())
}
