//! `init`: scaffold the agent directory

use anyhow::{Context, Result};
use repo_agent_core::config::init_workspace;
use std::path::Path;
use tracing::info;

pub fn execute(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    info!("Initializing repo-agent in {}", root.display());

    let report = init_workspace(&paths)
        .with_context(|| format!("Failed to initialize {}", paths.agent_dir.display()))?;

    for path in &report.created {
        println!("Created {}", path.display());
    }
    for path in &report.existing {
        println!("Kept existing {}", path.display());
    }

    println!("\n✅ repo-agent initialized successfully!");
    println!("\nNext steps:");
    println!("  1. Describe the project in .agent/purpose.md and .agent/standards.md");
    println!("  2. Adjust .agent/rules.yaml and .agent/ignore.yaml");
    println!("  3. Run 'repo-agent start' to begin recording changes");
    Ok(())
}
