//! Core functionality for repo-agent
//!
//! This crate watches a source tree and records every file-level change in
//! an append-only activity log, attributes changes to AI tools or manual
//! edits, and checks files against a declarative rule set.

pub mod activity;
pub mod agent;
pub mod config;
pub mod error;
pub mod index;
pub mod monitor;
pub mod rules;
pub mod vcs;

pub use error::{AgentError, Result};
