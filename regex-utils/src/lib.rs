//! Regex utilities for repo-agent
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns for the per-day activity log blocks
pub mod log_block {
    use super::*;

    /// `[YYYY-MM-DD HH:MM:SS] EVENT_KIND`
    pub static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\] (\S+)\s*$")
            .expect("Invalid regex pattern")
    });

    /// Split a block header into its timestamp and event kind tokens
    pub fn parse_header(line: &str) -> Option<(&str, &str)> {
        let caps = HEADER_PATTERN.captures(line)?;
        let timestamp = caps.get(1)?.as_str();
        let kind = caps.get(2)?.as_str();
        Some((timestamp, kind))
    }
}

/// Patterns for log file names
pub mod log_file {
    use super::*;

    pub static FILE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})\.log$").expect("Invalid regex pattern")
    });

    /// Extract the `YYYY-MM-DD` date part of a log file name
    pub fn date_part(file_name: &str) -> Option<&str> {
        FILE_NAME_PATTERN
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
