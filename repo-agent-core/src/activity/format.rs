//! Text block format of the per-day activity logs
//!
//! ```text
//!
//! ================================================================================
//! [YYYY-MM-DD HH:MM:SS] EVENT_KIND
//! PATH: <path>
//! SOURCE: <label>          (optional)
//! BRANCH: <branch>         (optional)
//! DIFF:                    (optional, exclusive with CONTENT)
//! <diff>
//! CONTENT:                 (optional, exclusive with DIFF)
//! <content>
//! ================================================================================
//! ```
//!
//! Optional lines are detected by label prefix, never by position.

use super::{ChangeEvent, EventKind};
use chrono::{Local, NaiveDateTime, TimeZone};
use regex_utils::log_block;
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RULE_WIDTH: usize = 80;

const PATH_LABEL: &str = "PATH: ";
const SOURCE_LABEL: &str = "SOURCE: ";
const BRANCH_LABEL: &str = "BRANCH: ";
const DIFF_LABEL: &str = "DIFF:";
const CONTENT_LABEL: &str = "CONTENT:";

pub fn separator() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render one event as a log block
pub fn render_block(event: &ChangeEvent) -> String {
    let rule = separator();
    let mut block = format!("\n{}\n", rule);
    block.push_str(&format!("[{}] {}\n", event.timestamp.format(TIMESTAMP_FORMAT), event.kind));
    block.push_str(&format!("{}{}\n", PATH_LABEL, event.path));

    if let Some(source) = &event.source {
        block.push_str(&format!("{}{}\n", SOURCE_LABEL, source));
    }
    if let Some(branch) = &event.branch {
        block.push_str(&format!("{}{}\n", BRANCH_LABEL, branch));
    }

    if let Some(diff) = &event.diff {
        block.push_str(&format!("{}\n{}\n", DIFF_LABEL, diff));
    } else if let Some(content) = &event.content {
        block.push_str(&format!("{}\n{}\n", CONTENT_LABEL, content));
    }

    block.push_str(&rule);
    block.push('\n');
    block
}

/// Parse every well-formed block in a log file.
///
/// A block opens with a rule line directly followed by a header. It closes
/// at the first rule line after which only blank lines or another block
/// follow, so rules inside logged content never split a block. Blocks
/// without a recognizable header or `PATH:` line are skipped.
pub fn parse_blocks(text: &str) -> Vec<ChangeEvent> {
    let rule = separator();
    let lines: Vec<&str> = text.split('\n').collect();

    let opens_block = |at: usize| {
        lines.get(at) == Some(&rule.as_str())
            && lines.get(at + 1).is_some_and(|line| log_block::parse_header(line).is_some())
    };
    let closes_block = |at: usize| {
        lines[at] == rule
            && (lines[at + 1..].iter().all(|line| line.is_empty())
                || (lines.get(at + 1) == Some(&"") && opens_block(at + 2)))
    };

    let mut events = Vec::new();
    let mut at = 0;
    while at < lines.len() {
        if !opens_block(at) {
            at += 1;
            continue;
        }

        let start = at + 1;
        let end = (start + 1..lines.len()).find(|&i| closes_block(i)).unwrap_or(lines.len());
        match parse_block(&lines[start..end].join("\n")) {
            Some(event) => events.push(event),
            None => debug!("Skipping unparseable log block"),
        }
        at = end + 1;
    }
    events
}

fn parse_block(block: &str) -> Option<ChangeEvent> {
    let mut lines = block.split_inclusive('\n');
    let header = lines.next()?.trim_end_matches('\n');
    let (timestamp, kind) = log_block::parse_header(header)?;

    let kind: EventKind = kind.parse().ok()?;
    let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    let timestamp = Local.from_local_datetime(&naive).earliest()?;

    let mut event = ChangeEvent {
        kind,
        timestamp,
        path: String::new(),
        content: None,
        diff: None,
        source: None,
        branch: None,
    };
    let mut has_path = false;
    let mut offset = header.len() + 1;

    for line in lines {
        let text = line.trim_end_matches('\n');
        offset += line.len();

        if let Some(path) = text.strip_prefix(PATH_LABEL) {
            event.path = path.to_string();
            has_path = true;
        } else if let Some(source) = text.strip_prefix(SOURCE_LABEL) {
            event.source = Some(source.to_string());
        } else if let Some(branch) = text.strip_prefix(BRANCH_LABEL) {
            event.branch = Some(branch.to_string());
        } else if text == DIFF_LABEL {
            event.diff = Some(block.get(offset..).unwrap_or_default().to_string());
            break;
        } else if text == CONTENT_LABEL {
            event.content = Some(block.get(offset..).unwrap_or_default().to_string());
            break;
        }
    }

    has_path.then_some(event)
}
