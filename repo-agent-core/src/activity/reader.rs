//! Read-only access to the per-day activity logs

use super::ChangeEvent;
use super::format::parse_blocks;
use crate::error::{AgentError, Result};
use chrono::NaiveDate;
use regex_utils::log_file;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| AgentError::InvalidDate(text.to_string()))
}

/// Parse the blocks of one log file's text
pub fn parse_log(text: &str) -> Vec<ChangeEvent> {
    parse_blocks(text)
}

/// View over a logs directory. Never writes.
#[derive(Debug, Clone)]
pub struct LogStore {
    logs_dir: PathBuf,
}

impl LogStore {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self { logs_dir: logs_dir.into() }
    }

    fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir.join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    /// Dates with a log file, oldest first
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        if !self.logs_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut dates = Vec::new();
        for entry in fs::read_dir(&self.logs_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(log_file::date_part) else {
                debug!("Skipping non-log file {:?}", name);
                continue;
            };
            if let Ok(date) = parse_date(date) {
                dates.push(date);
            }
        }

        dates.sort();
        Ok(dates)
    }

    /// Raw text of one day's log, `None` when no events were recorded
    pub fn read_day(&self, date: NaiveDate) -> Result<Option<String>> {
        let path = self.day_file(date);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Concatenated text of every day in `from..=to`, in date order
    pub fn read_range(&self, from: NaiveDate, to: NaiveDate) -> Result<String> {
        let mut text = String::new();
        for date in self.dates()?.into_iter().filter(|d| *d >= from && *d <= to) {
            if let Some(day) = self.read_day(date)? {
                text.push_str(&day);
            }
        }
        Ok(text)
    }

    /// Parsed events of one day
    pub fn events_on(&self, date: NaiveDate) -> Result<Vec<ChangeEvent>> {
        Ok(self.read_day(date)?.map(|text| parse_log(&text)).unwrap_or_default())
    }
}
