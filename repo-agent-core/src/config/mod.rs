//! Agent configuration and on-disk layout
//!
//! Everything the agent persists lives under `.agent/` at the root of the
//! watched tree:
//! - `config.yaml`: watcher settings
//! - `ignore.yaml`: path ignore patterns
//! - `rules.yaml`: compliance rules
//! - `logs/`: per-day activity logs
//! - `.pid` / `.paused`: liveness and pause markers
//!
//! Missing files fall back to built-in defaults.

mod defaults;
mod scaffold;

pub use scaffold::{InitReport, init_workspace};

use crate::error::{AgentError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const AGENT_DIR: &str = ".agent";

/// Resolved locations of the agent's files for one watched tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPaths {
    pub root: PathBuf,
    pub agent_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
    pub ignore_file: PathBuf,
    pub rules_file: PathBuf,
    pub standards_file: PathBuf,
    pub purpose_file: PathBuf,
    pub scan_file: PathBuf,
    pub pid_file: PathBuf,
    pub pause_file: PathBuf,
}

impl AgentPaths {
    /// `root` is made absolute so every logged path is absolute
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = absolute_root(root.as_ref());
        let agent_dir = root.join(AGENT_DIR);

        Self {
            logs_dir: agent_dir.join("logs"),
            config_file: agent_dir.join("config.yaml"),
            ignore_file: agent_dir.join("ignore.yaml"),
            rules_file: agent_dir.join("rules.yaml"),
            standards_file: agent_dir.join("standards.md"),
            purpose_file: agent_dir.join("purpose.md"),
            scan_file: agent_dir.join("scan.json"),
            pid_file: agent_dir.join(".pid"),
            pause_file: agent_dir.join(".paused"),
            root,
            agent_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.agent_dir.is_dir()
    }

    /// Fail with [`AgentError::NotInitialized`] unless `init` has been run
    pub fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AgentError::NotInitialized(self.agent_dir.clone()))
        }
    }
}

/// Canonical form of `root`, or a lexically absolute one if it does not exist
fn absolute_root(root: &Path) -> PathBuf {
    root.canonicalize()
        .or_else(|_| std::path::absolute(root))
        .unwrap_or_else(|_| root.to_path_buf())
}

/// Watcher settings from `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Extensions (with leading dot) of files worth tracking
    pub watch_extensions: Vec<String>,
    /// Model used by the report generator; carried through untouched
    pub model: String,
    /// Seconds between branch checks
    pub branch_poll_interval_secs: u64,
    /// Added lines above which a change counts as a bulk edit.
    /// Tunable heuristic, not a semantic boundary.
    pub bulk_change_threshold: usize,
    /// Read every tracked file at startup so the first edit yields a diff
    pub prepopulate_snapshots: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            watch_extensions: defaults::WATCH_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            model: "gpt-4o".to_string(),
            branch_poll_interval_secs: 2,
            bulk_change_threshold: 10,
            prepopulate_snapshots: true,
        }
    }
}

impl AgentConfig {
    pub fn branch_poll_interval(&self) -> Duration {
        Duration::from_secs(self.branch_poll_interval_secs.max(1))
    }
}

pub fn default_ignore_patterns() -> Vec<String> {
    defaults::IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

/// Load `config.yaml`, falling back to defaults when absent or malformed
pub fn load_config(paths: &AgentPaths) -> AgentConfig {
    load_yaml_or(&paths.config_file, AgentConfig::default)
}

/// Load `ignore.yaml`, falling back to defaults when absent or malformed
pub fn load_ignore_patterns(paths: &AgentPaths) -> Vec<String> {
    // An empty ignore.yaml deserializes to null
    let patterns: Option<Vec<String>> = load_yaml_or(&paths.ignore_file, || Some(default_ignore_patterns()));
    patterns.unwrap_or_default()
}

/// Read and deserialize a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|source| AgentError::Config { path: path.to_path_buf(), source })
}

pub(crate) fn load_yaml_or<T, F>(path: &Path, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    if !path.exists() {
        debug!("{} not found, using defaults", path.display());
        return fallback();
    }

    match read_yaml(path) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}; using defaults", e);
            fallback()
        }
    }
}
