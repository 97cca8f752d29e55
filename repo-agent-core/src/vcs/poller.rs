//! Background detection of branch switches

use super::BranchSource;
use crate::activity::{ChangeEvent, EventKind, EventSink};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on how long `stop` waits for the loop to exit
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Running,
    Stopped,
}

struct Worker {
    stop_tx: Sender<()>,
    done_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Polls the branch source and emits `BRANCH_SWITCHED` on change.
///
/// A poller whose source has no branch at start never runs.
pub struct BranchPoller {
    worker: Mutex<Option<Worker>>,
    // Held while emitting; cleared by `stop` so nothing is emitted after it returns
    active: Arc<Mutex<bool>>,
    last_branch: Arc<Mutex<Option<String>>>,
}

impl BranchPoller {
    pub fn start(source: Arc<dyn BranchSource>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        let initial = source.current_branch();
        let last_branch = Arc::new(Mutex::new(initial.clone()));
        let active = Arc::new(Mutex::new(initial.is_some()));

        let Some(initial) = initial else {
            info!("No version control branch found, branch polling disabled");
            return Self {
                worker: Mutex::new(None),
                active,
                last_branch,
            };
        };

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let loop_active = Arc::clone(&active);
        let loop_last = Arc::clone(&last_branch);

        let handle = thread::spawn(move || {
            let mut current = initial;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let Some(branch) = source.current_branch() else {
                    continue;
                };
                if branch == current {
                    continue;
                }

                let guard = loop_active.lock().unwrap_or_else(|p| p.into_inner());
                if !*guard {
                    break;
                }
                let event = ChangeEvent::new(EventKind::BranchSwitched, ChangeEvent::transition(&current, &branch))
                    .with_branch(Some(branch.clone()));
                if let Err(e) = sink.emit(&event) {
                    warn!("Failed to log branch switch: {}", e);
                }
                drop(guard);

                *loop_last.lock().unwrap_or_else(|p| p.into_inner()) = Some(branch.clone());
                current = branch;
            }
            let _ = done_tx.send(());
        });

        info!("Branch polling started every {:?}", interval);
        Self {
            worker: Mutex::new(Some(Worker { stop_tx, done_rx, handle })),
            active,
            last_branch,
        }
    }

    pub fn state(&self) -> PollerState {
        let running = self
            .worker
            .lock()
            .map(|worker| worker.as_ref().is_some_and(|w| !w.handle.is_finished()))
            .unwrap_or(false);
        if running { PollerState::Running } else { PollerState::Stopped }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    /// Last branch observed
    pub fn current_branch(&self) -> Option<String> {
        self.last_branch.lock().map(|b| b.clone()).unwrap_or(None)
    }

    /// Signal the loop and wait a bounded time for it to exit.
    /// Safe to call more than once and from any thread.
    pub fn stop(&self) {
        *self.active.lock().unwrap_or_else(|p| p.into_inner()) = false;

        let worker = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(worker) = worker else {
            return;
        };

        let _ = worker.stop_tx.send(());
        match worker.done_rx.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.handle.join();
                info!("Branch polling stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("Branch poller did not exit within {:?}, detaching", STOP_TIMEOUT);
            }
        }
    }
}

impl Drop for BranchPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
