//! `.agent/` directory scaffolding

use super::{AgentConfig, AgentPaths, default_ignore_patterns, defaults};
use crate::error::{AgentError, Result};
use crate::rules::RuleSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files and directories created by [`init_workspace`]
#[derive(Debug, Default)]
pub struct InitReport {
    pub created: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
}

/// Create the agent directory with default configuration files.
/// Existing files are left untouched.
pub fn init_workspace(paths: &AgentPaths) -> Result<InitReport> {
    let mut report = InitReport::default();

    for dir in [&paths.agent_dir, &paths.logs_dir] {
        if dir.is_dir() {
            report.existing.push(dir.clone());
        } else {
            fs::create_dir_all(dir)?;
            report.created.push(dir.clone());
        }
    }

    let config = to_yaml(&paths.config_file, &AgentConfig::default())?;
    let ignore = to_yaml(&paths.ignore_file, &default_ignore_patterns())?;
    let rules = to_yaml(&paths.rules_file, &RuleSet::default())?;

    let files: [(&Path, &str); 5] = [
        (&paths.config_file, &config),
        (&paths.ignore_file, &ignore),
        (&paths.rules_file, &rules),
        (&paths.standards_file, defaults::STANDARDS_TEMPLATE),
        (&paths.purpose_file, defaults::PURPOSE_TEMPLATE),
    ];

    for (path, contents) in files {
        if path.exists() {
            report.existing.push(path.to_path_buf());
            continue;
        }
        fs::write(path, contents)?;
        report.created.push(path.to_path_buf());
    }

    info!("Initialized agent in {}", paths.root.display());
    Ok(report)
}

fn to_yaml<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|source| AgentError::Config { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, load_ignore_patterns};
    use crate::rules::load_rules;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AgentPaths::new(temp_dir.path());

        let report = init_workspace(&paths).unwrap();
        assert_eq!(report.created.len(), 7);
        assert!(paths.logs_dir.is_dir());

        assert_eq!(load_config(&paths), AgentConfig::default());
        assert_eq!(load_ignore_patterns(&paths), default_ignore_patterns());
        assert_eq!(load_rules(&paths), RuleSet::default());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AgentPaths::new(temp_dir.path());
        fs::create_dir_all(&paths.agent_dir).unwrap();
        fs::write(&paths.standards_file, "# Ours").unwrap();

        let report = init_workspace(&paths).unwrap();
        assert!(report.existing.contains(&paths.standards_file));
        assert_eq!(fs::read_to_string(&paths.standards_file).unwrap(), "# Ours");
    }
}
