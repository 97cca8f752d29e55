//! Last-known content of tracked files

use super::PathFilter;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Read a file as UTF-8, treating any failure as empty content
pub fn read_content(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// In-memory snapshots keyed by path
#[derive(Debug, Default)]
pub struct ContentSnapshotStore {
    entries: HashMap<String, String>,
}

impl ContentSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-known content, empty if never seen
    pub fn get(&self, path: &str) -> &str {
        self.entries.get(path).map(String::as_str).unwrap_or_default()
    }

    pub fn put(&mut self, path: impl Into<String>, content: String) {
        self.entries.insert(path.into(), content);
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read every in-scope file under `root`
    pub fn prepopulate(&mut self, root: &Path, filter: &PathFilter) {
        for path in filter.walk(root) {
            let content = read_content(&path);
            self.put(path.to_string_lossy(), content);
        }
        info!("Loaded {} file snapshots", self.entries.len());
    }
}
