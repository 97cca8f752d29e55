//! Watch session lifecycle: start, stop, status, pause, resume

use anyhow::{Context, Result};
use repo_agent_core::AgentError;
use repo_agent_core::agent::{self, Liveness, WatchSession};
use std::path::Path;
use std::time::Duration;
use tracing::info;

const TICK: Duration = Duration::from_secs(1);

/// Run a watch session in the foreground until SIGINT or SIGTERM
pub async fn start(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);

    let mut session = match WatchSession::start(paths) {
        Ok(session) => session,
        Err(AgentError::AlreadyRunning(pid)) => {
            println!("Agent already running (PID: {})", pid);
            return Ok(());
        }
        Err(e @ AgentError::NotInitialized(_)) => {
            println!("Error: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to start agent"),
    };

    println!("Agent started. Watching: {}", session.paths().root.display());
    println!("Press Ctrl+C to stop.");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = ticker.tick() => {
                session.tick();
            }
        }
    }

    println!("\nStopping agent...");
    session.shutdown().context("Failed to stop agent cleanly")?;
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

pub fn stop(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    match agent::terminate(&paths).context("Failed to stop agent")? {
        Some(pid) => println!("Agent stopped (PID: {})", pid),
        None => println!("Agent is not running."),
    }
    Ok(())
}

pub fn status(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    match agent::probe(&paths) {
        Liveness::NotRunning => println!("Agent is not running."),
        Liveness::Running(pid) => {
            let paused = if agent::is_paused(&paths) { " [paused]" } else { "" };
            println!("Agent is running (PID: {}){}", pid, paused);
        }
        Liveness::Stale(_) => {
            println!("Agent is not running (stale PID file).");
            agent::clear_stale_marker(&paths)?;
        }
    }
    Ok(())
}

pub fn pause(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    if !matches!(agent::probe(&paths), Liveness::Running(_)) {
        println!("Agent is not running.");
        return Ok(());
    }
    agent::request_pause(&paths)?;
    println!("Agent paused. Changes are not recorded until 'repo-agent resume'.");
    Ok(())
}

pub fn resume(root: &Path) -> Result<()> {
    let paths = super::agent_paths(root);
    agent::request_resume(&paths)?;
    match agent::probe(&paths) {
        Liveness::Running(_) => println!("Agent resumed."),
        _ => println!("Agent is not running."),
    }
    Ok(())
}
