//! OS file system notifications via the notify crate

use super::dispatch::{FileWatchCore, RawEvent, RawKind};
use crate::error::Result;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Translate a notify event into zero or more raw events.
///
/// Access and metadata-only events are dropped.
pub fn translate(event: &Event) -> Vec<RawEvent> {
    let per_path = |kind: RawKind, is_dir: bool| -> Vec<RawEvent> {
        event
            .paths
            .iter()
            .map(|path| RawEvent {
                kind,
                src: path.clone(),
                dest: None,
                is_dir: is_dir || path.is_dir(),
            })
            .collect()
    };

    match &event.kind {
        EventKind::Create(kind) => per_path(RawKind::Created, *kind == CreateKind::Folder),
        EventKind::Remove(kind) => per_path(RawKind::Deleted, *kind == RemoveKind::Folder),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both => match event.paths.as_slice() {
                [src, dest, ..] => vec![rename(src.clone(), dest.clone())],
                _ => Vec::new(),
            },
            RenameMode::From => per_path(RawKind::Deleted, false),
            RenameMode::To => per_path(RawKind::Created, false),
            // Platforms that cannot pair renames report each side alone
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|path| {
                    let kind = if path.exists() { RawKind::Created } else { RawKind::Deleted };
                    RawEvent {
                        kind,
                        src: path.clone(),
                        dest: None,
                        is_dir: path.is_dir(),
                    }
                })
                .collect(),
        },
        EventKind::Modify(_) => per_path(RawKind::Modified, false),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Source half of a rename waiting for its destination
#[derive(Debug)]
struct PendingRename {
    tracker: Option<usize>,
    src: PathBuf,
}

/// Joins the separate halves of a rename into one event.
///
/// inotify reports a rename as a `From` half, a `To` half and then a `Both`
/// event carrying both paths. The halves are matched by tracker cookie and
/// the redundant `Both` is dropped. A `From` with no matching `To` is a move
/// out of the tree and becomes a deletion once anything else arrives; a lone
/// `To` is a move into the tree and becomes a creation.
#[derive(Debug, Default)]
pub struct RenamePairer {
    pending: Option<PendingRename>,
    paired: Option<(PathBuf, PathBuf)>,
}

impl RenamePairer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw events for `event`, in delivery order
    pub fn accept(&mut self, event: &Event) -> Vec<RawEvent> {
        let tracker = event.attrs.tracker();
        match (&event.kind, event.paths.as_slice()) {
            (EventKind::Modify(ModifyKind::Name(RenameMode::From)), [src]) => {
                let raw = self.flush();
                self.pending = Some(PendingRename {
                    tracker,
                    src: src.clone(),
                });
                raw
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::To)), [dest]) => {
                match self.pending.take() {
                    Some(pending) if pending.tracker == tracker => {
                        self.paired = Some((pending.src.clone(), dest.clone()));
                        vec![rename(pending.src, dest.clone())]
                    }
                    pending => {
                        self.pending = pending;
                        let mut raw = self.flush();
                        raw.extend(translate(event));
                        raw
                    }
                }
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), [src, dest, ..])
                if self.paired.as_ref().is_some_and(|(s, d)| s == src && d == dest) =>
            {
                self.paired = None;
                Vec::new()
            }
            _ => {
                let translated = translate(event);
                if translated.is_empty() {
                    return translated;
                }
                let mut raw = self.flush();
                raw.extend(translated);
                raw
            }
        }
    }

    /// A `From` still waiting is reported as a deletion
    pub fn flush(&mut self) -> Vec<RawEvent> {
        self.paired = None;
        match self.pending.take() {
            Some(pending) => {
                debug!("Rename source {} has no destination", pending.src.display());
                vec![RawEvent::new(RawKind::Deleted, pending.src)]
            }
            None => Vec::new(),
        }
    }
}

fn rename(src: PathBuf, dest: PathBuf) -> RawEvent {
    let is_dir = dest.is_dir();
    let mut raw = RawEvent::renamed(src, dest);
    raw.is_dir = is_dir;
    raw
}

/// Start a recursive watcher on `root` that feeds the shared core.
///
/// Dispatch runs on the notify delivery thread while holding the core lock,
/// so acquiring that lock waits for any in-flight event.
pub fn spawn_watcher(root: &Path, core: Arc<Mutex<FileWatchCore>>) -> Result<RecommendedWatcher> {
    let mut renames = RenamePairer::new();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let raw_events = renames.accept(&event);
            if raw_events.is_empty() {
                debug!("Nothing to log for {:?}", event.kind);
                return;
            }

            let mut core = match core.lock() {
                Ok(core) => core,
                Err(poisoned) => poisoned.into_inner(),
            };
            for raw in raw_events {
                if let Err(e) = core.handle(raw) {
                    warn!("Failed to log change: {}", e);
                }
            }
        }
        Err(e) => error!("Watch error: {:?}", e),
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    info!("Watching path: {:?} (recursive: true)", root);
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_basic_translation() {
        let created = translate(&event(EventKind::Create(CreateKind::File), &["/nope/a.py"]));
        assert_eq!(created, vec![RawEvent::new(RawKind::Created, "/nope/a.py")]);

        let modified = translate(&event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/nope/a.py"]));
        assert_eq!(modified[0].kind, RawKind::Modified);

        let removed = translate(&event(EventKind::Remove(RemoveKind::Folder), &["/nope/pkg"]));
        assert_eq!(removed, vec![RawEvent::new(RawKind::Deleted, "/nope/pkg").dir()]);
    }

    #[test]
    fn test_renames() {
        let both = translate(&event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/nope/a.py", "/nope/b.py"]));
        assert_eq!(both, vec![RawEvent::renamed("/nope/a.py", "/nope/b.py")]);

        let from = translate(&event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/nope/a.py"]));
        assert_eq!(from[0].kind, RawKind::Deleted);

        let to = translate(&event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/nope/b.py"]));
        assert_eq!(to[0].kind, RawKind::Created);

        let any = translate(&event(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), &["/nope/c.py"]));
        assert_eq!(any[0].kind, RawKind::Deleted);
    }

    fn accept_all(pairer: &mut RenamePairer, events: &[Event]) -> Vec<RawEvent> {
        events.iter().flat_map(|e| pairer.accept(e)).collect()
    }

    #[test]
    fn test_rename_halves_collapse_into_one_rename() {
        let name = |mode| EventKind::Modify(ModifyKind::Name(mode));
        let mut pairer = RenamePairer::new();

        let raw = accept_all(
            &mut pairer,
            &[
                event(name(RenameMode::From), &["/nope/old.py"]).set_tracker(7),
                event(name(RenameMode::To), &["/nope/new.py"]).set_tracker(7),
                event(name(RenameMode::Both), &["/nope/old.py", "/nope/new.py"]).set_tracker(7),
            ],
        );
        assert_eq!(raw, vec![RawEvent::renamed("/nope/old.py", "/nope/new.py")]);
        assert!(pairer.flush().is_empty());
    }

    #[test]
    fn test_unpaired_rename_halves() {
        let name = |mode| EventKind::Modify(ModifyKind::Name(mode));
        let mut pairer = RenamePairer::new();

        // Moved out of the tree, then something else happens
        let raw = accept_all(
            &mut pairer,
            &[
                event(name(RenameMode::From), &["/nope/gone.py"]).set_tracker(1),
                event(EventKind::Access(AccessKind::Any), &["/nope/other.py"]),
                event(EventKind::Create(CreateKind::File), &["/nope/other.py"]),
            ],
        );
        assert_eq!(
            raw,
            vec![RawEvent::new(RawKind::Deleted, "/nope/gone.py"), RawEvent::new(RawKind::Created, "/nope/other.py")]
        );

        // Moved into the tree
        let raw = pairer.accept(&event(name(RenameMode::To), &["/nope/arrived.py"]).set_tracker(2));
        assert_eq!(raw, vec![RawEvent::new(RawKind::Created, "/nope/arrived.py")]);

        // Mismatched cookies are two separate moves
        let raw = accept_all(
            &mut pairer,
            &[
                event(name(RenameMode::From), &["/nope/a.py"]).set_tracker(3),
                event(name(RenameMode::To), &["/nope/b.py"]).set_tracker(4),
            ],
        );
        assert_eq!(
            raw,
            vec![RawEvent::new(RawKind::Deleted, "/nope/a.py"), RawEvent::new(RawKind::Created, "/nope/b.py")]
        );

        let raw = pairer.accept(&event(name(RenameMode::From), &["/nope/last.py"]).set_tracker(5));
        assert!(raw.is_empty());
        assert_eq!(pairer.flush(), vec![RawEvent::new(RawKind::Deleted, "/nope/last.py")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_watched_rename_logs_single_event() {
        use crate::activity::EventKind as LogKind;
        use crate::activity::testing::RecordingSink;
        use crate::agent::PauseFlag;
        use crate::config::default_ignore_patterns;
        use crate::monitor::attribution::testing::attributor;
        use crate::monitor::dispatch::{CoreParts, TracingReporter};
        use crate::monitor::filter::PathFilter;
        use crate::rules::{RuleEngine, RuleSet};
        use crate::vcs::testing::StaticBranch;
        use std::fs;
        use std::thread;
        use std::time::{Duration, Instant};
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let old = root.join("old.py");
        let new = root.join("new.py");
        fs::write(&old, "a = 1\nb = 2\n").unwrap();

        let sink = Arc::new(RecordingSink::default());
        let mut core = FileWatchCore::new(CoreParts {
            filter: PathFilter::new(default_ignore_patterns(), vec![".py".to_string()]),
            attributor: attributor(vec![]),
            sink: sink.clone(),
            branch: Arc::new(StaticBranch::new(None)),
            rules: RuleEngine::new(RuleSet::default()),
            reporter: Arc::new(TracingReporter),
            pause: PauseFlag::default(),
        });
        core.prepopulate(&root);
        let core = Arc::new(Mutex::new(core));
        let watcher = spawn_watcher(&root, Arc::clone(&core)).unwrap();

        fs::rename(&old, &new).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.events().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        // Room for any stray halves to arrive
        thread::sleep(Duration::from_millis(300));
        drop(watcher);

        let events = sink.events();
        assert_eq!(events.len(), 1, "{:?}", events);
        assert_eq!(events[0].kind, LogKind::Renamed);
        assert_eq!(events[0].path, format!("{} -> {}", old.display(), new.display()));
        assert!(events[0].diff.is_none());
        assert_eq!(events[0].source.as_deref(), Some("Manual Edit"));
    }

    #[test]
    fn test_noise_is_dropped() {
        assert!(translate(&event(EventKind::Access(AccessKind::Any), &["/nope/a.py"])).is_empty());
        assert!(translate(&event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), &["/nope/a.py"])).is_empty());
        assert!(translate(&event(EventKind::Other, &["/nope/a.py"])).is_empty());
    }
}
