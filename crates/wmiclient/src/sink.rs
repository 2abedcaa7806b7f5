//! Progress and trace reporting hooks.

use std::net::IpAddr;

use tracing::{debug, info};

/// Log target for sink forwarding.
const SINK_TARGET: &str = "wmiclient::sink";

/// Receives progress narration and protocol traces from the client.
///
/// Both hooks default to no-ops. Implementations must not block for long:
/// they run on the thread that is driving the agent.
pub trait StatusSink: Send + Sync {
    /// Reports a change of state, such as waiting for the agent to finish.
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// Reports verbose traces: commands issued and raw protocol lines.
    fn on_debug(&self, message: &str) {
        let _ = message;
    }
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {}

/// Forwards sink messages to `tracing`, prefixed with the target host.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    host: IpAddr,
}

impl TracingSink {
    /// Creates a sink that tags every message with `host`.
    #[must_use]
    pub const fn new(host: IpAddr) -> Self {
        Self { host }
    }
}

impl StatusSink for TracingSink {
    fn on_status(&self, message: &str) {
        info!(target: SINK_TARGET, "{}: {message}", self.host);
    }

    fn on_debug(&self, message: &str) {
        debug!(target: SINK_TARGET, "{}: {message}", self.host);
    }
}
