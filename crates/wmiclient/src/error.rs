//! Errors raised by the wmiclient protocol engine.
//!
//! Fatal conditions (launch, framing, transport) and classified result codes
//! share one enum so callers can propagate everything with `?` and still
//! match on [`ClientError::kind`] when they want to treat a classified
//! failure such as `NotFound` as an ordinary outcome. I/O errors are wrapped
//! in `Arc` to keep the enum small.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::codes::{ClassifiedError, ErrorKind};
use crate::identity::ResolutionError;
use crate::result::RequestResult;

/// Errors surfaced by identities, transports, and the request dispatcher.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The target host could not be resolved to an address.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The agent process could not be started.
    #[error("failed to launch agent `{command}`: {source}")]
    LaunchFailed {
        /// Redacted command line that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The agent wrote output that does not follow the framing grammar.
    ///
    /// The session is considered corrupted; the worker is discarded.
    #[error("agent protocol violation: {message} (line: {line:?})")]
    ProtocolViolation {
        /// What was expected.
        message: String,
        /// The offending line.
        line: String,
    },

    /// A request could not be written even after restarting the agent.
    #[error("failed to write request after restarting the agent: {source}")]
    TransportFailure {
        /// Error from the retried write.
        #[source]
        source: Arc<io::Error>,
    },

    /// The agent closed its output stream in the middle of a session.
    #[error("agent process closed its output stream")]
    WorkerExited,

    /// Any other I/O error on the agent's pipes.
    #[error("I/O error communicating with the agent: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A request argument cannot be carried by the line protocol.
    #[error("request argument {argument:?} contains a line break")]
    InvalidArgument {
        /// The rejected argument.
        argument: String,
    },

    /// Well-framed output that a convenience call could not interpret.
    #[error("unexpected agent output: {message}")]
    MalformedOutput {
        /// Description of the problem.
        message: String,
    },

    /// The agent answered with a non-zero result code.
    #[error(transparent)]
    Classified(#[from] ClassifiedError),
}

impl ClientError {
    /// Returns the classified kind for non-zero result codes.
    ///
    /// Fatal conditions have no kind and return `None`.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Classified(error) => Some(error.kind()),
            _ => None,
        }
    }

    /// Returns the result that produced a classified failure.
    #[must_use]
    pub fn result(&self) -> Option<&RequestResult> {
        match self {
            Self::Classified(error) => Some(error.result()),
            _ => None,
        }
    }

    /// Returns true for failures that leave nothing to classify.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Classified(_))
    }

    pub(crate) fn io(source: io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>, line: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
            line: line.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use rstest::rstest;

    use super::*;
    use crate::codes::CodeTable;

    fn classified(code: i64) -> ClientError {
        let result = RequestResult::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            code,
            Vec::new(),
            vec!["detail".to_owned()],
        );
        ClientError::from(CodeTable::default().error(result))
    }

    #[rstest]
    fn classified_errors_expose_kind_and_result() {
        let error = classified(2);

        assert_eq!(error.kind(), Some(ErrorKind::NotFound));
        assert_eq!(
            error.result().map(RequestResult::error),
            Some(&["detail".to_owned()][..])
        );
        assert!(!error.is_fatal());
    }

    #[rstest]
    #[case::worker_exited(ClientError::WorkerExited)]
    #[case::protocol(ClientError::protocol("expected marker", "garbage"))]
    #[case::io(ClientError::io(io::Error::other("boom")))]
    fn fatal_errors_have_no_kind(#[case] error: ClientError) {
        assert_eq!(error.kind(), None);
        assert!(error.result().is_none());
        assert!(error.is_fatal());
    }

    #[rstest]
    fn protocol_violation_message_includes_line() {
        let error = ClientError::protocol("expected end marker", "= END THINGS");
        let message = error.to_string();

        assert!(
            message.contains("= END THINGS"),
            "expected line in message: {message}"
        );
    }

    #[test]
    fn client_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
