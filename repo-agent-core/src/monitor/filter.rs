//! Path scoping: extension allow-list and ignore-pattern deny-list

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Decides which paths the agent tracks
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    ignore_patterns: Vec<String>,
    extensions: Vec<String>,
}

impl PathFilter {
    /// `extensions` carry a leading dot (`.py`)
    pub fn new(ignore_patterns: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            ignore_patterns,
            extensions,
        }
    }

    /// True if any ignore pattern matches the path.
    ///
    /// - `dir/` matches when the path contains `dir`
    /// - `*.ext` matches when the path ends with `.ext`
    /// - anything else matches by substring
    pub fn is_ignored(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.ignore_patterns.iter().any(|pattern| {
            if let Some(dir) = pattern.strip_suffix('/') {
                path.contains(dir)
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                path.ends_with(suffix)
            } else {
                path.contains(pattern.as_str())
            }
        })
    }

    /// True if the extension is empty or allow-listed
    pub fn has_watched_extension(&self, path: &Path) -> bool {
        match dotted_extension(path) {
            None => true,
            Some(ext) => self.extensions.iter().any(|allowed| *allowed == ext),
        }
    }

    pub fn in_scope(&self, path: &Path) -> bool {
        !self.is_ignored(path) && self.has_watched_extension(path)
    }

    /// Every in-scope file under `root`, sorted by name, ignored
    /// directories pruned
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry.path()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.has_watched_extension(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

/// Extension with its leading dot, `None` when the path has none
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_ignore_patterns;
    use std::fs;
    use tempfile::TempDir;

    fn filter() -> PathFilter {
        PathFilter::new(default_ignore_patterns(), vec![".py".to_string(), ".js".to_string()])
    }

    #[test]
    fn test_directory_patterns_win_over_extensions() {
        let filter = filter();
        assert!(!filter.in_scope(Path::new("/repo/node_modules/pkg/index.js")));
        assert!(!filter.in_scope(Path::new("/repo/app/__pycache__/mod.py")));
        assert!(!filter.in_scope(Path::new("/repo/.git/hooks/pre-commit")));
        assert!(filter.in_scope(Path::new("/repo/app/main.py")));
    }

    #[test]
    fn test_extension_allow_list() {
        let filter = PathFilter::new(Vec::new(), vec![".py".to_string()]);
        assert!(!filter.in_scope(Path::new("/repo/README.md")));
        assert!(filter.in_scope(Path::new("/repo/Makefile")));
        assert!(filter.in_scope(Path::new("/repo/tool.py")));
    }

    #[test]
    fn test_suffix_and_substring_patterns() {
        let filter = filter();
        assert!(filter.is_ignored(Path::new("/repo/mod.pyc")));
        assert!(filter.is_ignored(Path::new("/repo/debug.log")));
        assert!(filter.is_ignored(Path::new("/repo/.env")));
        assert!(!filter.is_ignored(Path::new("/repo/environment.py")));
    }

    #[test]
    fn test_walk_is_sorted_and_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("src/b.py"), "").unwrap();
        fs::write(root.join("src/a.py"), "").unwrap();
        fs::write(root.join("notes.md"), "").unwrap();
        fs::write(root.join("node_modules/lib/x.js"), "").unwrap();

        let files = filter().walk(root);
        assert_eq!(files, vec![root.join("src/a.py"), root.join("src/b.py")]);
    }
}
