//! Session transport state.

use super::worker::Worker;

/// Internal state of a session transport.
pub(super) enum SessionState {
    /// No agent is running; the next request launches one.
    Idle,
    /// An agent is running and ready for requests.
    Connected(Worker),
    /// The last round-trip failed fatally; the next request relaunches.
    Failed,
}

impl SessionState {
    pub(super) const fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::Connected(_) => SessionPhase::Connected,
            Self::Failed => SessionPhase::Failed,
        }
    }
}

/// Observable phase of a session transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No agent is running.
    Idle,
    /// An agent is running.
    Connected,
    /// The previous request failed fatally and the agent was discarded.
    Failed,
}
