//! Filesystem monitoring and change capture
//!
//! Raw notifications flow through:
//! - path scoping against the extension allow-list and ignore patterns
//! - snapshot lookup and unified diffing
//! - source attribution
//! - the activity log, followed by a non-blocking rule check

pub mod attribution;
pub mod diff;
pub mod dispatch;
pub mod filter;
pub mod snapshot;
pub mod watcher;

pub use attribution::{Attribution, ProcessProbe, SourceAttributor, SystemProcessProbe};
pub use diff::{DiffEngine, LineDiff};
pub use dispatch::{CoreParts, FileWatchCore, RawEvent, RawKind, TracingReporter, ViolationReporter};
pub use filter::PathFilter;
pub use snapshot::ContentSnapshotStore;
pub use watcher::{RenamePairer, spawn_watcher, translate};
