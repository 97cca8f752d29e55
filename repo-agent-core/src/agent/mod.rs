//! Agent lifecycle: cross-process markers and the in-process watch session

pub mod control;
pub mod runtime;

pub use control::{
    AgentControl, AgentState, Liveness, PauseFlag, clear_stale_marker, is_paused, probe, request_pause,
    request_resume, terminate,
};
pub use runtime::WatchSession;
