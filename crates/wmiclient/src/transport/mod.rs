//! Transports that carry requests to the agent.
//!
//! Two strategies implement [`Transport`]:
//!
//! - [`OneShotTransport`] spawns a fresh agent per request and captures its
//!   exit code, stdout, and stderr.
//! - [`SessionTransport`] keeps one agent alive in session mode and exchanges
//!   marker-framed requests with it, restarting it once when it has gone away.
//!
//! Process creation for the session strategy sits behind
//! [`WorkerLauncher`], so tests can drive the state machine with in-memory
//! pipes.

mod lifecycle;
mod oneshot;
mod session;
mod state;
mod worker;

pub use oneshot::OneShotTransport;
pub use session::SessionTransport;
pub use state::SessionPhase;
pub use worker::{ProcessLauncher, Worker, WorkerLauncher};

use crate::error::ClientError;

/// Code, output lines, and error lines returned by one round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Result code reported by the agent.
    pub code: i64,
    /// Output lines.
    pub output: Vec<String>,
    /// Error lines.
    pub error: Vec<String>,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub const fn new(code: i64, output: Vec<String>, error: Vec<String>) -> Self {
        Self {
            code,
            output,
            error,
        }
    }
}

/// Carries one request to the agent and returns its response.
///
/// Requests are strictly sequential: `&mut self` keeps a transport from
/// having more than one request in flight.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Sends `args` (verb followed by parameters) and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns launch, framing, and I/O failures. A non-zero result code is
    /// not an error at this layer.
    fn execute(&mut self, args: &[String]) -> Result<Response, ClientError>;

    /// Releases any agent process held by the transport.
    ///
    /// Safe to call repeatedly; the transport stays usable afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport cannot release its resources.
    fn close(&mut self) -> Result<(), ClientError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&mut self, args: &[String]) -> Result<Response, ClientError> {
        (**self).execute(args)
    }

    fn close(&mut self) -> Result<(), ClientError> {
        (**self).close()
    }
}

/// Encodes a request as one protocol line, without the trailing newline.
///
/// Every argument is wrapped in double quotes with embedded backslashes and
/// quotes escaped, and the arguments are joined by single spaces.
pub(crate) fn encode_request(args: &[String]) -> Result<String, ClientError> {
    let mut line = String::new();
    for (index, argument) in args.iter().enumerate() {
        if argument.contains(['\n', '\r']) {
            return Err(ClientError::InvalidArgument {
                argument: argument.clone(),
            });
        }
        if index > 0 {
            line.push(' ');
        }
        line.push('"');
        for character in argument.chars() {
            if matches!(character, '"' | '\\') {
                line.push('\\');
            }
            line.push(character);
        }
        line.push('"');
    }
    Ok(line)
}
