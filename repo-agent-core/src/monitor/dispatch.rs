//! Turns raw filesystem notifications into logged change events

use super::attribution::SourceAttributor;
use super::diff::DiffEngine;
use super::filter::PathFilter;
use super::snapshot::{ContentSnapshotStore, read_content};
use crate::activity::{ChangeEvent, EventKind, EventSink};
use crate::agent::PauseFlag;
use crate::error::Result;
use crate::rules::{Finding, RuleEngine};
use crate::vcs::BranchSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Created,
    Modified,
    Deleted,
    Renamed,
}

/// A notification after translation from the OS watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawKind,
    pub src: PathBuf,
    /// Destination of a rename
    pub dest: Option<PathBuf>,
    pub is_dir: bool,
}

impl RawEvent {
    pub fn new(kind: RawKind, src: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            src: src.into(),
            dest: None,
            is_dir: false,
        }
    }

    pub fn renamed(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            kind: RawKind::Renamed,
            src: src.into(),
            dest: Some(dest.into()),
            is_dir: false,
        }
    }

    pub fn dir(mut self) -> Self {
        self.is_dir = true;
        self
    }

    /// Path the filter decides on: the destination for renames
    pub fn subject(&self) -> &Path {
        self.dest.as_deref().unwrap_or(&self.src)
    }
}

/// Receives rule violations found while a change is being logged
pub trait ViolationReporter: Send + Sync {
    fn report(&self, path: &Path, violations: &[Finding]);
}

/// Reports violations as warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ViolationReporter for TracingReporter {
    fn report(&self, path: &Path, violations: &[Finding]) {
        warn!("{} violation(s) in {}", violations.len(), path.display());
        for finding in violations {
            warn!("  {}: {}", finding.finding_type, finding.message);
        }
    }
}

/// Collaborators of the dispatch core
pub struct CoreParts {
    pub filter: PathFilter,
    pub attributor: SourceAttributor,
    pub sink: Arc<dyn EventSink>,
    pub branch: Arc<dyn BranchSource>,
    pub rules: RuleEngine,
    pub reporter: Arc<dyn ViolationReporter>,
    pub pause: PauseFlag,
}

/// Processes one notification at a time, in delivery order
pub struct FileWatchCore {
    filter: PathFilter,
    snapshots: ContentSnapshotStore,
    diff: DiffEngine,
    attributor: SourceAttributor,
    sink: Arc<dyn EventSink>,
    branch: Arc<dyn BranchSource>,
    rules: RuleEngine,
    reporter: Arc<dyn ViolationReporter>,
    pause: PauseFlag,
    stopped: bool,
}

impl FileWatchCore {
    pub fn new(parts: CoreParts) -> Self {
        Self {
            filter: parts.filter,
            snapshots: ContentSnapshotStore::new(),
            diff: DiffEngine::new(),
            attributor: parts.attributor,
            sink: parts.sink,
            branch: parts.branch,
            rules: parts.rules,
            reporter: parts.reporter,
            pause: parts.pause,
            stopped: false,
        }
    }

    /// Snapshot every tracked file so the first edit yields a diff
    pub fn prepopulate(&mut self, root: &Path) {
        self.snapshots.prepopulate(root, &self.filter);
    }

    pub fn snapshots(&self) -> &ContentSnapshotStore {
        &self.snapshots
    }

    /// Discard every later notification
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Handle one notification. Returns the logged event, if any.
    pub fn handle(&mut self, event: RawEvent) -> Result<Option<ChangeEvent>> {
        if self.stopped || self.pause.is_paused() {
            debug!("Discarding {:?} for {}", event.kind, event.src.display());
            return Ok(None);
        }
        if event.is_dir {
            return Ok(None);
        }
        if !self.filter.in_scope(event.subject()) {
            debug!("Out of scope: {}", event.subject().display());
            return Ok(None);
        }

        let (logged, checked) = match (event.kind, &event.dest) {
            (RawKind::Created, _) => (self.on_created(&event.src), None),
            (RawKind::Modified, _) => (self.on_modified(&event.src), Some(event.src.as_path())),
            (RawKind::Deleted, _) => (self.on_deleted(&event.src), None),
            (RawKind::Renamed, Some(dest)) => (self.on_renamed(&event.src, dest), Some(dest.as_path())),
            // A rename without a destination is a removal
            (RawKind::Renamed, None) => (self.on_deleted(&event.src), None),
        };

        // The record is durable before rules run
        self.sink.emit(&logged)?;
        if let Some(path) = checked {
            self.report_violations(path);
        }
        Ok(Some(logged))
    }

    fn on_created(&mut self, path: &Path) -> ChangeEvent {
        let key = path.to_string_lossy().to_string();
        let content = read_content(path);
        self.snapshots.put(key.clone(), content.clone());

        ChangeEvent::new(EventKind::Created, key)
            .with_content(Some(content))
            .with_branch(self.branch.current_branch())
    }

    fn on_modified(&mut self, path: &Path) -> ChangeEvent {
        let key = path.to_string_lossy().to_string();
        let new = read_content(path);
        let diff = self.diff.diff(self.snapshots.get(&key), &new);
        let added = diff.as_ref().map_or(0, |d| d.added);
        let source = self.attributor.attribute(&key, added);
        self.snapshots.put(key.clone(), new);

        ChangeEvent::new(EventKind::Modified, key)
            .with_diff(diff.map(|d| d.text))
            .with_source(Some(source))
            .with_branch(self.branch.current_branch())
    }

    fn on_deleted(&mut self, path: &Path) -> ChangeEvent {
        let key = path.to_string_lossy().to_string();
        self.snapshots.remove(&key);

        ChangeEvent::new(EventKind::Deleted, key).with_branch(self.branch.current_branch())
    }

    fn on_renamed(&mut self, src: &Path, dest: &Path) -> ChangeEvent {
        let old_key = src.to_string_lossy().to_string();
        let new_key = dest.to_string_lossy().to_string();

        let old = self.snapshots.remove(&old_key).unwrap_or_default();
        let new = read_content(dest);
        let diff = if old.is_empty() {
            self.diff.additions(&new)
        } else {
            self.diff.diff(&old, &new)
        };
        let added = diff.as_ref().map_or(0, |d| d.added);
        let source = self.attributor.attribute(&new_key, added);
        self.snapshots.put(new_key.clone(), new);

        ChangeEvent::new(EventKind::Renamed, ChangeEvent::transition(&old_key, &new_key))
            .with_diff(diff.map(|d| d.text))
            .with_source(Some(source))
            .with_branch(self.branch.current_branch())
    }

    /// Real-time rule check; findings are reported, never block logging
    fn report_violations(&self, path: &Path) {
        let violations: Vec<Finding> = self.rules.check_file(path).into_iter().filter(Finding::is_violation).collect();
        if !violations.is_empty() {
            self.reporter.report(path, &violations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::testing::RecordingSink;
    use crate::config::default_ignore_patterns;
    use crate::monitor::attribution::testing::attributor;
    use crate::rules::RuleSet;
    use crate::vcs::testing::StaticBranch;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp_dir: TempDir,
        sink: Arc<RecordingSink>,
        pause: PauseFlag,
        core: FileWatchCore,
    }

    fn fixture(processes: Vec<&'static str>) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let pause = PauseFlag::default();
        let core = FileWatchCore::new(CoreParts {
            filter: PathFilter::new(default_ignore_patterns(), vec![".py".to_string()]),
            attributor: attributor(processes),
            sink: sink.clone(),
            branch: Arc::new(StaticBranch::new(Some("main"))),
            rules: RuleEngine::new(RuleSet::default()),
            reporter: Arc::new(TracingReporter),
            pause: pause.clone(),
        });
        Fixture {
            temp_dir,
            sink,
            pause,
            core,
        }
    }

    #[test]
    fn test_create_then_modify() {
        let mut f = fixture(vec![]);
        let path = f.temp_dir.path().join("app.py");

        fs::write(&path, "a\nb\n").unwrap();
        f.core.handle(RawEvent::new(RawKind::Created, &path)).unwrap();

        fs::write(&path, "a\nb\nc\n").unwrap();
        f.core.handle(RawEvent::new(RawKind::Modified, &path)).unwrap();

        let events = f.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[0].content.as_deref(), Some("a\nb\n"));
        assert_eq!(events[0].branch.as_deref(), Some("main"));

        assert_eq!(events[1].kind, EventKind::Modified);
        assert_eq!(events[1].diff.as_deref(), Some("--- \n+++ \n@@ -1,2 +1,3 @@\n a\n b\n+c"));
        assert_eq!(events[1].source.as_deref(), Some("Manual Edit"));
        assert!(events[1].content.is_none());
    }

    #[test]
    fn test_modify_without_snapshot_has_no_diff() {
        let mut f = fixture(vec!["claude"]);
        let path = f.temp_dir.path().join("new.py");
        fs::write(&path, "x = 1\n".repeat(20)).unwrap();

        let event = f.core.handle(RawEvent::new(RawKind::Modified, &path)).unwrap().unwrap();
        assert!(event.diff.is_none());
        assert_eq!(event.source.as_deref(), Some("Manual Edit"));
        assert_eq!(f.core.snapshots().len(), 1);
    }

    #[test]
    fn test_bulk_change_attribution() {
        let mut f = fixture(vec!["claude"]);
        let path = f.temp_dir.path().join("gen.py");
        fs::write(&path, "start = 0\n").unwrap();
        f.core.handle(RawEvent::new(RawKind::Created, &path)).unwrap();

        fs::write(&path, format!("start = 0\n{}", "y = 2\n".repeat(11))).unwrap();
        let event = f.core.handle(RawEvent::new(RawKind::Modified, &path)).unwrap().unwrap();
        assert_eq!(event.source.as_deref(), Some("Claude Code (high confidence)"));
    }

    #[test]
    fn test_rename_moves_snapshot() {
        let mut f = fixture(vec![]);
        let old = f.temp_dir.path().join("old.py");
        let new = f.temp_dir.path().join("new.py");

        fs::write(&old, "a\n").unwrap();
        f.core.handle(RawEvent::new(RawKind::Created, &old)).unwrap();
        fs::rename(&old, &new).unwrap();
        fs::write(&new, "a\nb\n").unwrap();

        let event = f.core.handle(RawEvent::renamed(&old, &new)).unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Renamed);
        assert_eq!(event.path, format!("{} -> {}", old.display(), new.display()));
        assert_eq!(event.diff.as_deref(), Some("--- \n+++ \n@@ -1 +1,2 @@\n a\n+b"));
        assert_eq!(f.core.snapshots().get(&old.to_string_lossy()), "");
        assert_eq!(f.core.snapshots().get(&new.to_string_lossy()), "a\nb\n");
    }

    #[test]
    fn test_rename_without_prior_content_is_all_additions() {
        let mut f = fixture(vec![]);
        let old = f.temp_dir.path().join("draft.txt");
        let new = f.temp_dir.path().join("final.py");
        fs::write(&new, "x = 1\n").unwrap();

        let event = f.core.handle(RawEvent::renamed(&old, &new)).unwrap().unwrap();
        assert_eq!(event.diff.as_deref(), Some("--- \n+++ \n@@ -0,0 +1 @@\n+x = 1"));
    }

    #[test]
    fn test_delete_drops_snapshot() {
        let mut f = fixture(vec![]);
        let path = f.temp_dir.path().join("gone.py");
        fs::write(&path, "a\n").unwrap();
        f.core.handle(RawEvent::new(RawKind::Created, &path)).unwrap();
        fs::remove_file(&path).unwrap();

        let event = f.core.handle(RawEvent::new(RawKind::Deleted, &path)).unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Deleted);
        assert!(event.content.is_none() && event.diff.is_none());
        assert!(f.core.snapshots().is_empty());
    }

    #[test]
    fn test_filtered_paused_and_directory_events_are_dropped() {
        let mut f = fixture(vec![]);
        let root = f.temp_dir.path();

        assert!(f.core.handle(RawEvent::new(RawKind::Created, root.join("notes.md"))).unwrap().is_none());
        assert!(f.core.handle(RawEvent::new(RawKind::Created, root.join("__pycache__/m.py"))).unwrap().is_none());
        assert!(f.core.handle(RawEvent::new(RawKind::Created, root.join("pkg")).dir()).unwrap().is_none());

        f.pause.set(true);
        assert!(f.core.handle(RawEvent::new(RawKind::Deleted, root.join("a.py"))).unwrap().is_none());
        f.pause.set(false);

        f.core.stop();
        assert!(f.core.handle(RawEvent::new(RawKind::Deleted, root.join("a.py"))).unwrap().is_none());
        assert!(f.sink.events().is_empty());
    }

    /// Records emits and reports in one timeline
    #[derive(Default)]
    struct Journal(std::sync::Mutex<Vec<String>>);

    impl Journal {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl EventSink for Journal {
        fn emit(&self, event: &ChangeEvent) -> Result<()> {
            self.0.lock().unwrap().push(format!("logged {}", event.kind));
            Ok(())
        }
    }

    impl ViolationReporter for Journal {
        fn report(&self, _path: &Path, violations: &[Finding]) {
            for finding in violations {
                self.0.lock().unwrap().push(format!("violation {}", finding.finding_type));
            }
        }
    }

    #[test]
    fn test_change_is_logged_before_rules_report() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(Journal::default());
        let mut core = FileWatchCore::new(CoreParts {
            filter: PathFilter::new(default_ignore_patterns(), vec![".py".to_string()]),
            attributor: attributor(vec![]),
            sink: journal.clone(),
            branch: Arc::new(StaticBranch::new(None)),
            rules: RuleEngine::new(RuleSet::default()),
            reporter: journal.clone(),
            pause: PauseFlag::default(),
        });

        let path = temp_dir.path().join("server.py");
        fs::write(&path, "x = 1\n").unwrap();
        core.handle(RawEvent::new(RawKind::Created, &path)).unwrap();
        fs::write(&path, "x = 2\n").unwrap();
        core.handle(RawEvent::new(RawKind::Modified, &path)).unwrap();

        assert_eq!(
            journal.entries(),
            vec!["logged FILE_CREATED", "logged FILE_MODIFIED", "violation FORBIDDEN_FILE"]
        );
    }

    #[test]
    fn test_vanished_file_is_tolerated() {
        let mut f = fixture(vec![]);
        let path = f.temp_dir.path().join("flash.py");

        let event = f.core.handle(RawEvent::new(RawKind::Created, &path)).unwrap().unwrap();
        assert!(event.content.is_none());
        let event = f.core.handle(RawEvent::new(RawKind::Modified, &path)).unwrap().unwrap();
        assert!(event.diff.is_none());
    }
}
