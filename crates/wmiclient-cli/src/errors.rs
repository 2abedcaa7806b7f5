//! Error types for the CLI runtime.

use std::io::{self, Write};
use std::sync::Arc;

use thiserror::Error;
use wmiclient::ClientError;

use crate::output::{RenderError, render_failure};
use crate::telemetry::TelemetryError;

/// Exit status for configuration and usage problems.
const EXIT_USAGE: u8 = 2;
/// Exit status for failed requests.
const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(TelemetryError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AppError {
    /// Process exit status for this failure.
    pub(crate) const fn exit_code(&self) -> u8 {
        match self {
            Self::LoadConfiguration(_) | Self::Telemetry(_) => EXIT_USAGE,
            Self::Client(_) | Self::Render(_) => EXIT_FAILURE,
        }
    }

    /// Writes the failure to `stderr`, including any agent error lines.
    pub(crate) fn report<E: Write>(&self, stderr: &mut E) -> io::Result<()> {
        match self {
            Self::Client(error) => render_failure(error, stderr),
            other => writeln!(stderr, "wmiclient: {other}"),
        }
    }
}
