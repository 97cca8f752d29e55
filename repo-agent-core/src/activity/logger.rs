//! Append-only per-day event log writer

use super::format::{TIMESTAMP_FORMAT, render_block};
use super::{ChangeEvent, EventSink};
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// Writes change events to `<logs_dir>/<YYYY-MM-DD>.log`
pub struct EventLogger {
    logs_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl EventLogger {
    /// Create a logger, creating the log directory if needed
    pub fn new(logs_dir: impl Into<PathBuf>) -> Result<Self> {
        let logs_dir = logs_dir.into();
        fs::create_dir_all(&logs_dir)?;

        Ok(Self {
            logs_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Log file that holds events stamped on the event's day
    pub fn log_file_for(&self, event: &ChangeEvent) -> PathBuf {
        self.logs_dir.join(format!("{}.log", event.timestamp.format("%Y-%m-%d")))
    }

    /// Append one event block
    pub fn write(&self, event: &ChangeEvent) -> Result<()> {
        let block = render_block(event);
        let log_file = self.log_file_for(event);

        {
            // A poisoned lock only means another writer panicked mid-append
            let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            fs::create_dir_all(&self.logs_dir)?;
            let mut file = OpenOptions::new().create(true).append(true).open(&log_file)?;
            file.write_all(block.as_bytes())?;
        }

        info!("[{} {}: {}]", event.timestamp.format(TIMESTAMP_FORMAT), event.kind, event.path);
        Ok(())
    }
}

impl EventSink for EventLogger {
    fn emit(&self, event: &ChangeEvent) -> Result<()> {
        self.write(event)
    }
}
