//! Heuristic attribution of a change to an AI tool or a person
//!
//! The label depends only on which known processes are running and on the
//! number of added lines. Priority, first match wins:
//! 1. AI assistant running and a bulk change
//! 2. editor running and a bulk change
//! 3. editor running
//! 4. bulk change with nothing recognized
//! 5. manual edit

use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::{debug, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// A recognizable program and the process names it runs under
#[derive(Debug, Clone, Copy)]
pub struct ToolSignature {
    pub name: &'static str,
    pub processes: &'static [&'static str],
}

pub const AI_ASSISTANTS: &[ToolSignature] = &[
    ToolSignature { name: "Claude Code", processes: &["claude"] },
    ToolSignature { name: "Cursor", processes: &["cursor"] },
    ToolSignature { name: "Aider", processes: &["aider"] },
    ToolSignature { name: "Codex", processes: &["codex"] },
    ToolSignature { name: "Windsurf", processes: &["windsurf"] },
    ToolSignature { name: "GitHub Copilot", processes: &["copilot", "copilot-agent", "copilot-language-server"] },
    ToolSignature { name: "Gemini CLI", processes: &["gemini"] },
];

pub const EDITORS: &[ToolSignature] = &[
    ToolSignature { name: "VS Code", processes: &["code", "code-insiders"] },
    ToolSignature { name: "Vim", processes: &["vim", "nvim", "gvim"] },
    ToolSignature { name: "Emacs", processes: &["emacs"] },
    ToolSignature { name: "Sublime Text", processes: &["sublime_text", "subl"] },
    ToolSignature {
        name: "JetBrains IDE",
        processes: &["idea", "pycharm", "webstorm", "goland", "clion", "rider"],
    },
    ToolSignature { name: "Zed", processes: &["zed"] },
];

/// Source of running process names
pub trait ProcessProbe: Send + Sync {
    /// Lowercased executable base names. Empty on failure.
    fn running_processes(&self) -> HashSet<String>;
}

/// Lists processes through the OS process table
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn running_processes(&self) -> HashSet<String> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(list_process_names());
        });

        match rx.recv_timeout(PROBE_TIMEOUT) {
            Ok(names) => names,
            Err(_) => {
                warn!("Process listing timed out after {:?}", PROBE_TIMEOUT);
                HashSet::new()
            }
        }
    }
}

fn list_process_names() -> HashSet<String> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
    );

    let mut names = HashSet::new();
    for process in system.processes().values() {
        names.insert(normalize_process_name(&process.name().to_string_lossy()));
        // Linux caps process names at 15 bytes; the executable name is whole
        if let Some(exe) = process.exe().and_then(|path| path.file_name()) {
            names.insert(normalize_process_name(&exe.to_string_lossy()));
        }
    }
    names.remove("");
    debug!("{} distinct process names", names.len());
    names
}

/// Lowercased base name without directory or `.exe`
pub fn normalize_process_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).to_lowercase();
    match base.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => base,
    }
}

/// Outcome of the attribution heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Assistant(&'static str),
    EditorBulk(&'static str),
    Editor(&'static str),
    BulkUnknown,
    Manual,
}

impl Attribution {
    pub fn label(&self) -> String {
        match self {
            Attribution::Assistant(tool) => format!("{} (high confidence)", tool),
            Attribution::EditorBulk(editor) => format!("{} (AI tool likely)", editor),
            Attribution::Editor(editor) => editor.to_string(),
            Attribution::BulkUnknown => "AI tool (likely)".to_string(),
            Attribution::Manual => "Manual Edit".to_string(),
        }
    }
}

fn find_running(signatures: &[ToolSignature], running: &HashSet<String>) -> Option<&'static str> {
    signatures
        .iter()
        .find(|sig| sig.processes.iter().any(|p| running.contains(*p)))
        .map(|sig| sig.name)
}

/// Labels changes using a process probe and a bulk-change threshold
pub struct SourceAttributor {
    probe: Box<dyn ProcessProbe>,
    bulk_threshold: usize,
}

impl SourceAttributor {
    pub fn new(probe: Box<dyn ProcessProbe>, bulk_threshold: usize) -> Self {
        Self { probe, bulk_threshold }
    }

    pub fn classify(&self, added_lines: usize) -> Attribution {
        let running = self.probe.running_processes();
        let bulk = added_lines > self.bulk_threshold;

        let assistant = find_running(AI_ASSISTANTS, &running);
        let editor = find_running(EDITORS, &running);

        match (assistant, editor) {
            (Some(tool), _) if bulk => Attribution::Assistant(tool),
            (_, Some(editor)) if bulk => Attribution::EditorBulk(editor),
            (_, Some(editor)) => Attribution::Editor(editor),
            (None, None) if bulk => Attribution::BulkUnknown,
            _ => Attribution::Manual,
        }
    }

    /// Label for a change to `path` adding `added_lines` lines
    pub fn attribute(&self, path: &str, added_lines: usize) -> String {
        let attribution = self.classify(added_lines);
        debug!("Attributed {} (+{} lines) to {:?}", path, added_lines, attribution);
        attribution.label()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::attributor;
    use super::*;

    #[test]
    fn test_no_processes() {
        let attributor = attributor(vec![]);
        assert_eq!(attributor.attribute("/a.py", 11), "AI tool (likely)");
        assert_eq!(attributor.attribute("/a.py", 10), "Manual Edit");
        assert_eq!(attributor.attribute("/a.py", 3), "Manual Edit");
    }

    #[test]
    fn test_assistant_needs_bulk_change() {
        let attributor = attributor(vec!["claude", "bash"]);
        assert_eq!(attributor.attribute("/a.py", 25), "Claude Code (high confidence)");
        assert_eq!(attributor.attribute("/a.py", 2), "Manual Edit");
    }

    #[test]
    fn test_editor_labels() {
        let attributor = attributor(vec!["nvim"]);
        assert_eq!(attributor.attribute("/a.py", 40), "Vim (AI tool likely)");
        assert_eq!(attributor.attribute("/a.py", 1), "Vim");
    }

    #[test]
    fn test_assistant_beats_editor() {
        let attributor = attributor(vec!["code", "cursor"]);
        assert_eq!(attributor.attribute("/a.py", 12), "Cursor (high confidence)");
        assert_eq!(attributor.attribute("/a.py", 5), "VS Code");
    }

    #[test]
    fn test_threshold_is_tunable() {
        let attributor = SourceAttributor::new(Box::new(testing::StaticProbe(vec![])), 2);
        assert_eq!(attributor.classify(3), Attribution::BulkUnknown);
    }

    #[test]
    fn test_system_probe_lists_full_executable_names() {
        let exe = std::env::current_exe().unwrap();
        let own = normalize_process_name(&exe.file_name().unwrap().to_string_lossy());
        // Test binaries carry a hash suffix, well past the kernel's name limit
        assert!(own.len() > 15);

        let running = SystemProcessProbe.running_processes();
        assert!(running.contains(&own), "{} missing from process list", own);
    }

    #[test]
    fn test_normalize_process_name() {
        assert_eq!(normalize_process_name("/usr/bin/NVIM"), "nvim");
        assert_eq!(normalize_process_name("Code.exe"), "code");
        assert_eq!(normalize_process_name(r"C:\Tools\aider.exe"), "aider");
    }
}
