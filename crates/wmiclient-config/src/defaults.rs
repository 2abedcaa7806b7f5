use std::path::PathBuf;

use crate::agent::TransportMode;
use crate::logging::LogFormat;

/// Default location of the agent binary.
pub const DEFAULT_AGENT_PROGRAM: &str = "/usr/bin/wmic";

/// Flag that switches the agent into its long-lived session mode.
pub const DEFAULT_SESSION_FLAG: &str = "--interactive";

/// Interval between exit polls for one-shot invocations, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default agent program path.
pub fn default_agent_program() -> PathBuf {
    PathBuf::from(DEFAULT_AGENT_PROGRAM)
}

/// Owned session flag used where allocation is required (e.g. serde).
pub fn default_session_flag() -> String {
    DEFAULT_SESSION_FLAG.to_owned()
}

/// Default poll interval in milliseconds.
pub const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default transport strategy.
pub const fn default_transport_mode() -> TransportMode {
    TransportMode::Session
}

/// Default log filter expression used by the binary.
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
