//! Settings describing how the remote-management agent is launched.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{
    default_agent_program, default_poll_interval_ms, default_session_flag, default_transport_mode,
};

/// Strategy used to talk to the agent.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportMode {
    /// Keep one agent process alive and exchange framed requests with it.
    #[default]
    Session,
    /// Spawn a fresh agent process for every request.
    OneShot,
}

/// Launch settings for the agent process.
///
/// The credential flags (`--host`, `--user`, `--password`, `--domain`) are
/// not configurable; they are filled in from the target identity when the
/// command line is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// The executable path or command name.
    pub program: PathBuf,
    /// Arguments placed before the credential flags (for example a script
    /// path when the program is an interpreter).
    pub leading_args: Vec<String>,
    /// Arguments placed after the credential flags (for example `--debug`).
    pub extra_args: Vec<String>,
    /// Flag selecting the agent's session mode.
    pub session_flag: String,
    /// Transport strategy.
    pub mode: TransportMode,
    /// Exit-poll interval for one-shot invocations, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: default_agent_program(),
            leading_args: Vec::new(),
            extra_args: Vec::new(),
            session_flag: default_session_flag(),
            mode: default_transport_mode(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AgentConfig {
    /// Creates a configuration for the given program with default settings.
    #[must_use]
    pub fn for_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Sets the arguments placed before the credential flags.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the arguments placed after the credential flags.
    #[must_use]
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Selects the transport strategy.
    #[must_use]
    pub const fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the one-shot exit-poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Exit-poll interval for one-shot invocations.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
