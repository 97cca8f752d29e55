//! Unified line diffs between content snapshots
//!
//! Output follows the classic `difflib.unified_diff` layout with empty
//! file labels: `--- `, `+++ `, then `@@ -a,b +c,d @@` hunks with three
//! lines of context, joined by `\n` without a trailing newline.

use similar::{DiffTag, TextDiff};
use std::ops::Range;

const CONTEXT_LINES: usize = 3;

/// A rendered diff with its line counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    pub text: String,
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Diff two snapshots. `None` if either side is empty or nothing changed.
    pub fn diff(&self, old: &str, new: &str) -> Option<LineDiff> {
        if old.is_empty() || new.is_empty() {
            return None;
        }
        render(old, new)
    }

    /// Diff that adds every line of `new`, for content with no prior snapshot
    pub fn additions(&self, new: &str) -> Option<LineDiff> {
        if new.is_empty() {
            return None;
        }
        render("", new)
    }
}

fn render(old: &str, new: &str) -> Option<LineDiff> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let diff = TextDiff::from_slices(&old_lines, &new_lines);
    let groups = diff.grouped_ops(CONTEXT_LINES);
    let changed = groups
        .iter()
        .flatten()
        .any(|op| op.tag() != DiffTag::Equal);
    if !changed {
        return None;
    }

    let mut out = vec!["--- ".to_string(), "+++ ".to_string()];
    let mut added = 0;
    let mut removed = 0;

    for group in &groups {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(first.old_range().start, last.old_range().end),
            format_range(first.new_range().start, last.new_range().end),
        ));

        for op in group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    push_lines(&mut out, ' ', &old_lines, old_range);
                }
                DiffTag::Delete => removed += push_lines(&mut out, '-', &old_lines, old_range),
                DiffTag::Insert => added += push_lines(&mut out, '+', &new_lines, new_range),
                DiffTag::Replace => {
                    removed += push_lines(&mut out, '-', &old_lines, old_range);
                    added += push_lines(&mut out, '+', &new_lines, new_range);
                }
            }
        }
    }

    Some(LineDiff {
        text: out.join("\n"),
        added,
        removed,
    })
}

fn push_lines(out: &mut Vec<String>, marker: char, lines: &[&str], range: Range<usize>) -> usize {
    let count = range.len();
    out.extend(lines[range].iter().map(|line| format!("{}{}", marker, line)));
    count
}

/// `start,len` hunk range; a single line omits the length, an empty
/// range points at the line before it
fn format_range(start: usize, end: usize) -> String {
    let length = end - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, length),
    }
}
