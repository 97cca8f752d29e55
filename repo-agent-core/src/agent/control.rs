//! Liveness and pause markers
//!
//! `.agent/.pid` holds the pid of the watch process and keeps a second one
//! from starting on the same tree. `.agent/.paused` asks the running
//! process to discard events until it is removed.

use crate::config::AgentPaths;
use crate::error::{AgentError, Result};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tracing::{debug, info, warn};

const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Running,
    Paused,
    Stopped,
}

/// Shared pause switch checked by the dispatch core
#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Arc<AtomicBool>);

impl PauseFlag {
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::SeqCst);
    }
}

/// What the liveness marker says about a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    NotRunning,
    Running(u32),
    /// Marker left behind by a process that is gone
    Stale(u32),
}

fn read_pid(paths: &AgentPaths) -> Option<u32> {
    let text = fs::read_to_string(&paths.pid_file).ok()?;
    match text.trim().parse() {
        Ok(pid) => Some(pid),
        Err(_) => {
            warn!("Ignoring malformed pid marker {}", paths.pid_file.display());
            None
        }
    }
}

fn is_alive(system: &mut System, pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

/// Inspect the liveness marker
pub fn probe(paths: &AgentPaths) -> Liveness {
    let Some(pid) = read_pid(paths) else {
        return Liveness::NotRunning;
    };

    if is_alive(&mut System::new(), pid) {
        Liveness::Running(pid)
    } else {
        Liveness::Stale(pid)
    }
}

pub fn is_paused(paths: &AgentPaths) -> bool {
    paths.pause_file.exists()
}

/// Remove a marker whose process is gone
pub fn clear_stale_marker(paths: &AgentPaths) -> Result<()> {
    remove_if_exists(&paths.pid_file)
}

/// Ask the running process to discard events
pub fn request_pause(paths: &AgentPaths) -> Result<()> {
    paths.require_initialized()?;
    fs::write(&paths.pause_file, "paused\n")?;
    Ok(())
}

pub fn request_resume(paths: &AgentPaths) -> Result<()> {
    remove_if_exists(&paths.pause_file)
}

/// Send SIGTERM (or a hard kill where unsupported) to the recorded process,
/// wait briefly for it to exit and clear the markers.
///
/// Returns the pid that was signalled, `None` if nothing was running.
pub fn terminate(paths: &AgentPaths) -> Result<Option<u32>> {
    let liveness = probe(paths);
    let Liveness::Running(pid) = liveness else {
        if let Liveness::Stale(pid) = liveness {
            debug!("Clearing stale marker for pid {}", pid);
        }
        remove_if_exists(&paths.pid_file)?;
        remove_if_exists(&paths.pause_file)?;
        return Ok(None);
    };

    let mut system = System::new();
    if is_alive(&mut system, pid) {
        if let Some(process) = system.process(Pid::from_u32(pid)) {
            if process.kill_with(Signal::Term).is_none() {
                let _ = process.kill();
            }
        }
    }

    let deadline = Instant::now() + TERMINATE_TIMEOUT;
    while is_alive(&mut system, pid) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(100));
    }
    if is_alive(&mut system, pid) {
        warn!("Process {} still alive after {:?}", pid, TERMINATE_TIMEOUT);
    }

    remove_if_exists(&paths.pid_file)?;
    remove_if_exists(&paths.pause_file)?;
    info!("Terminated agent process {}", pid);
    Ok(Some(pid))
}

fn remove_if_exists(path: &std::path::Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Owns the markers for the watch session of this process
#[derive(Debug)]
pub struct AgentControl {
    paths: AgentPaths,
    state: AgentState,
    pause: PauseFlag,
    pid: u32,
}

impl AgentControl {
    pub fn new(paths: AgentPaths) -> Self {
        Self {
            paths,
            state: AgentState::Stopped,
            pause: PauseFlag::default(),
            pid: std::process::id(),
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn pause_flag(&self) -> PauseFlag {
        self.pause.clone()
    }

    /// Claim the liveness marker. Fails if another live process holds it.
    pub fn start(&mut self) -> Result<()> {
        self.paths.require_initialized()?;

        match probe(&self.paths) {
            Liveness::Running(pid) => return Err(AgentError::AlreadyRunning(pid)),
            Liveness::Stale(pid) => {
                warn!("Removing stale pid marker (PID: {})", pid);
                clear_stale_marker(&self.paths)?;
            }
            Liveness::NotRunning => {}
        }

        fs::write(&self.paths.pid_file, self.pid.to_string())?;
        self.state = AgentState::Running;
        self.sync_from_markers();
        info!("Agent marker written (PID: {})", self.pid);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        request_pause(&self.paths)?;
        self.sync_from_markers();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        request_resume(&self.paths)?;
        self.sync_from_markers();
        Ok(())
    }

    /// Adopt pause requests made by other processes
    pub fn sync_from_markers(&mut self) -> AgentState {
        if self.state == AgentState::Stopped {
            return self.state;
        }

        let paused = is_paused(&self.paths);
        let next = if paused { AgentState::Paused } else { AgentState::Running };
        if next != self.state {
            info!("Agent {}", if paused { "paused" } else { "resumed" });
        }
        self.pause.set(paused);
        self.state = next;
        self.state
    }

    /// Release the markers. Only a marker holding our own pid is removed.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == AgentState::Stopped {
            return Ok(());
        }

        if read_pid(&self.paths) == Some(self.pid) {
            remove_if_exists(&self.paths.pid_file)?;
        }
        remove_if_exists(&self.paths.pause_file)?;
        self.pause.set(false);
        self.state = AgentState::Stopped;
        Ok(())
    }
}
