//! Version control integration: current branch lookup and switch detection

pub mod poller;

pub use poller::{BranchPoller, PollerState};

use crate::error::Result;
use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of an abbreviated commit id for detached HEADs
const SHORT_OID_LEN: usize = 7;

/// Source of the currently checked-out branch name
pub trait BranchSource: Send + Sync {
    /// `None` when the tree is not under version control
    fn current_branch(&self) -> Option<String>;
}

/// Reads HEAD of the git repository containing a path
#[derive(Debug, Clone)]
pub struct GitBranchSource {
    root: PathBuf,
}

impl GitBranchSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn read_head(&self) -> Result<String> {
        let repo = Repository::discover(&self.root)?;
        let head = repo.find_reference("HEAD")?;

        if let Some(target) = head.symbolic_target() {
            return Ok(target.strip_prefix("refs/heads/").unwrap_or(target).to_string());
        }

        let oid = head
            .target()
            .ok_or_else(|| git2::Error::from_str("HEAD has no target"))?
            .to_string();
        Ok(oid.chars().take(SHORT_OID_LEN).collect())
    }
}

impl BranchSource for GitBranchSource {
    fn current_branch(&self) -> Option<String> {
        match self.read_head() {
            Ok(branch) => Some(branch),
            Err(e) => {
                debug!("No branch for {}: {}", self.root.display(), e);
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_branch_of_fresh_repository() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        repo.set_head("refs/heads/main").unwrap();

        let source = GitBranchSource::new(temp_dir.path().join("nested"));
        std::fs::create_dir_all(temp_dir.path().join("nested")).unwrap();
        assert_eq!(source.current_branch().as_deref(), Some("main"));
    }

    #[test]
    fn test_detached_head_is_short_oid() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        let signature = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[]).unwrap();
        repo.set_head_detached(oid).unwrap();

        let branch = GitBranchSource::new(temp_dir.path()).current_branch().unwrap();
        assert_eq!(branch, oid.to_string()[..7]);
    }

    #[test]
    fn test_outside_repository() {
        let temp_dir = TempDir::new().unwrap();
        // Guard against a repository above the temp dir
        let ceiling = temp_dir.path().to_path_buf();
        let source = GitBranchSource::new(&ceiling);
        if Repository::discover(&ceiling).is_err() {
            assert!(matches!(source.read_head(), Err(crate::error::AgentError::Git(_))));
            assert!(source.current_branch().is_none());
        }
    }
}
