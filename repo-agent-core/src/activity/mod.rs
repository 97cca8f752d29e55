//! Activity log: the durable record of every observed change
//!
//! Events are appended to one text file per day under `.agent/logs/`.
//! The block format is the contract shared with the dashboard and the
//! report generator, so [`format`] and [`reader`] must stay in lockstep.

pub mod format;
pub mod logger;
pub mod reader;

pub use logger::EventLogger;
pub use reader::LogStore;

use crate::error::Result;
use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of an observed occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
    Renamed,
    BranchSwitched,
}

impl EventKind {
    /// Token written in the block header
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "FILE_CREATED",
            EventKind::Modified => "FILE_MODIFIED",
            EventKind::Deleted => "FILE_DELETED",
            EventKind::Renamed => "FILE_RENAMED",
            EventKind::BranchSwitched => "BRANCH_SWITCHED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "FILE_CREATED" => Ok(EventKind::Created),
            "FILE_MODIFIED" => Ok(EventKind::Modified),
            "FILE_DELETED" => Ok(EventKind::Deleted),
            "FILE_RENAMED" => Ok(EventKind::Renamed),
            "BRANCH_SWITCHED" => Ok(EventKind::BranchSwitched),
            other => Err(format!("unknown event kind: {}", other)),
        }
    }
}

/// One observed filesystem or branch occurrence.
///
/// At most one of `content` and `diff` is set; the builder methods
/// clear the other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub timestamp: DateTime<Local>,
    pub path: String,
    pub content: Option<String>,
    pub diff: Option<String>,
    pub source: Option<String>,
    pub branch: Option<String>,
}

impl ChangeEvent {
    /// Create an event stamped with the current time, truncated to seconds
    pub fn new(kind: EventKind, path: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            kind,
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            path: path.into(),
            content: None,
            diff: None,
            source: None,
            branch: None,
        }
    }

    /// Path label for renames and branch switches
    pub fn transition(from: impl fmt::Display, to: impl fmt::Display) -> String {
        format!("{} -> {}", from, to)
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content.filter(|c| !c.is_empty());
        if self.content.is_some() {
            self.diff = None;
        }
        self
    }

    pub fn with_diff(mut self, diff: Option<String>) -> Self {
        self.diff = diff.filter(|d| !d.is_empty());
        if self.diff.is_some() {
            self.content = None;
        }
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }
}

/// Destination for change events.
///
/// Implementations must serialize concurrent calls: the file watcher and
/// the branch poller emit from different threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ChangeEvent) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps every event in memory
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<ChangeEvent>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<ChangeEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &ChangeEvent) -> Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }
}
