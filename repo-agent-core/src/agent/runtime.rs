//! A running watch session: watcher, branch poller and markers

use super::control::{AgentControl, AgentState};
use crate::activity::EventLogger;
use crate::config::{AgentPaths, load_config, load_ignore_patterns};
use crate::error::Result;
use crate::monitor::{
    CoreParts, FileWatchCore, PathFilter, SourceAttributor, SystemProcessProbe, TracingReporter, spawn_watcher,
};
use crate::rules::{RuleEngine, load_rules};
use crate::vcs::{BranchPoller, BranchSource, GitBranchSource};
use notify::RecommendedWatcher;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct WatchSession {
    paths: AgentPaths,
    control: AgentControl,
    core: Arc<Mutex<FileWatchCore>>,
    watcher: Option<RecommendedWatcher>,
    poller: BranchPoller,
}

impl WatchSession {
    /// Claim the liveness marker and start watching `paths.root`
    pub fn start(paths: AgentPaths) -> Result<Self> {
        let mut control = AgentControl::new(paths.clone());
        control.start()?;

        match Self::assemble(&paths, &control) {
            Ok((core, watcher, poller)) => {
                info!("Agent started. Watching: {}", paths.root.display());
                Ok(Self {
                    paths,
                    control,
                    core,
                    watcher: Some(watcher),
                    poller,
                })
            }
            Err(e) => {
                control.stop()?;
                Err(e)
            }
        }
    }

    fn assemble(
        paths: &AgentPaths,
        control: &AgentControl,
    ) -> Result<(Arc<Mutex<FileWatchCore>>, RecommendedWatcher, BranchPoller)> {
        let config = load_config(paths);
        let filter = PathFilter::new(load_ignore_patterns(paths), config.watch_extensions.clone());
        let logger = Arc::new(EventLogger::new(&paths.logs_dir)?);
        let branch: Arc<dyn BranchSource> = Arc::new(GitBranchSource::new(&paths.root));

        let mut core = FileWatchCore::new(CoreParts {
            filter,
            attributor: SourceAttributor::new(Box::new(SystemProcessProbe), config.bulk_change_threshold),
            sink: logger.clone(),
            branch: Arc::clone(&branch),
            rules: RuleEngine::new(load_rules(paths)),
            reporter: Arc::new(TracingReporter),
            pause: control.pause_flag(),
        });
        if config.prepopulate_snapshots {
            core.prepopulate(&paths.root);
        }

        let core = Arc::new(Mutex::new(core));
        let watcher = spawn_watcher(&paths.root, Arc::clone(&core))?;
        let poller = BranchPoller::start(branch, logger, config.branch_poll_interval());
        Ok((core, watcher, poller))
    }

    pub fn paths(&self) -> &AgentPaths {
        &self.paths
    }

    /// Main-loop tick: adopt pause requests from other processes
    pub fn tick(&mut self) -> AgentState {
        self.control.sync_from_markers()
    }

    pub fn state(&self) -> AgentState {
        self.control.state()
    }

    /// Stop the watcher, wait for in-flight dispatch, stop the poller and
    /// release the markers
    pub fn shutdown(mut self) -> Result<()> {
        drop(self.watcher.take());

        match self.core.lock() {
            Ok(mut core) => core.stop(),
            Err(poisoned) => poisoned.into_inner().stop(),
        }

        self.poller.stop();
        self.control.stop()?;
        info!("Agent stopped");
        Ok(())
    }
}
