// Command implementations, one module per concern

pub mod check;
pub mod init;
pub mod logs;
pub mod scan;
pub mod watch;

use repo_agent_core::config::{AgentPaths, load_config, load_ignore_patterns};
use repo_agent_core::monitor::PathFilter;
use std::path::Path;

/// Path filter built from the tree's config and ignore files
pub(crate) fn path_filter(paths: &AgentPaths) -> PathFilter {
    let config = load_config(paths);
    PathFilter::new(load_ignore_patterns(paths), config.watch_extensions)
}

pub(crate) fn agent_paths(root: &Path) -> AgentPaths {
    AgentPaths::new(root)
}
