//! Shared configuration for the wmiclient workspace.
//!
//! The [`Config`] type gathers the agent launch settings and the logging
//! settings used by the binary. `OrthoConfig` layers it, lowest first, from
//! built-in defaults, a TOML file (`--config-path` or `WMICLIENT_CONFIG_PATH`),
//! `WMICLIENT_*` environment variables, and command-line flags. Every field
//! has a default, so an empty TOML document is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod agent;
mod defaults;
mod logging;

pub use agent::{AgentConfig, TransportMode};
pub use defaults::{
    DEFAULT_AGENT_PROGRAM, DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SESSION_FLAG,
    default_agent_program, default_log_filter, default_log_filter_string, default_log_format,
    default_poll_interval_ms, default_session_flag, default_transport_mode,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Top-level configuration.
///
/// Keys are flat so each one maps to a single flag and environment
/// variable: `agent` is `--agent` and `WMICLIENT_AGENT`, `mode` is `--mode`
/// and `WMICLIENT_MODE`, and so on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "WMICLIENT")]
pub struct Config {
    /// Agent executable path or command name.
    #[ortho_config(default = default_agent_program())]
    pub agent: PathBuf,
    /// Arguments placed before the credential flags.
    #[ortho_config(merge_strategy = "append")]
    pub leading_args: Vec<String>,
    /// Arguments placed after the credential flags.
    #[ortho_config(merge_strategy = "append")]
    pub extra_args: Vec<String>,
    /// Flag selecting the agent's session mode.
    #[ortho_config(default = default_session_flag())]
    pub session_flag: String,
    /// Transport strategy.
    #[ortho_config(default = default_transport_mode())]
    pub mode: TransportMode,
    /// Exit-poll interval for one-shot invocations, in milliseconds.
    #[ortho_config(default = default_poll_interval_ms())]
    pub poll_interval_ms: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: default_agent_program(),
            leading_args: Vec::new(),
            extra_args: Vec::new(),
            session_flag: default_session_flag(),
            mode: default_transport_mode(),
            poll_interval_ms: default_poll_interval_ms(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or does
    /// not match the configuration schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: None,
            source: Box::new(source),
        })
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source: Box::new(source),
        })
    }

    /// Agent launch settings assembled from the flat keys.
    #[must_use]
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            program: self.agent.clone(),
            leading_args: self.leading_args.clone(),
            extra_args: self.extra_args.clone(),
            session_flag: self.session_flag.clone(),
            mode: self.mode,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration text is not valid.
    #[error("invalid configuration{}: {source}", describe_path(path.as_deref()))]
    Parse {
        /// File the text came from, when known.
        path: Option<PathBuf>,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },
}

fn describe_path(path: Option<&Path>) -> String {
    path.map(|value| format!(" in {}", value.display()))
        .unwrap_or_default()
}
