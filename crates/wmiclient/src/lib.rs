//! Client for a Windows remote-management agent driven over stdin/stdout.
//!
//! The agent (`wmic` or a compatible program) performs the actual remote
//! calls: service control, registry access, process management, and system
//! queries. This crate starts it with the target's credentials, carries
//! requests to it, parses its framed responses, and turns non-zero result
//! codes into typed failures.
//!
//! - [`TargetIdentity`] resolves the remote host once and holds credentials.
//! - [`transport`] runs the agent either once per request
//!   ([`OneShotTransport`]) or as a long-lived session
//!   ([`SessionTransport`]).
//! - [`frame`] parses the session protocol's marker-delimited responses.
//! - [`CodeTable`] classifies result codes into [`ErrorKind`]s.
//! - [`WmiClient`] dispatches requests and offers the convenience calls.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wmiclient::{AgentConfig, TargetIdentity, TracingSink, WmiClient, with_client};
//!
//! let identity = TargetIdentity::resolve("winbox.example.com", "CORP", "admin", "secret")?;
//! let sink = Arc::new(TracingSink::new(identity.host()));
//! let client = WmiClient::connect(identity, &AgentConfig::default(), sink);
//!
//! let uuid = with_client(client, |client| client.query_uuid().map(|(_, uuid)| uuid))?;
//! # Ok::<(), wmiclient::ClientError>(())
//! ```

mod agent;
mod client;
mod codes;
mod error;
pub mod frame;
mod identity;
mod network;
mod result;
mod sink;
pub mod transport;

pub use agent::AgentCommand;
pub use client::{ErrorPolicy, WmiClient, with_client};
pub use codes::{
    Classification, ClassifiedError, CodeTable, E_ACCESSDENIED, ERROR_ACCESS_DENIED,
    ERROR_FILE_NOT_FOUND, ERROR_INTERNAL_ERROR, ERROR_TIMEOUT, ERROR_WRONG_PASSWORD, ErrorKind,
    STATUS_LOGON_FAILURE, UNKNOWN_CODE, WAIT_TIMEOUT, WBEM_E_FAILED, classify,
};
pub use error::ClientError;
pub use identity::{HostResolver, ResolutionError, SystemResolver, TargetIdentity};
pub use network::{NetmaskError, NetworkInterface, netmask_prefix_len, parse_interfaces};
pub use result::RequestResult;
pub use sink::{NullSink, StatusSink, TracingSink};
pub use transport::{OneShotTransport, Response, SessionPhase, SessionTransport, Transport};
pub use wmiclient_config::{AgentConfig, TransportMode};

#[cfg(test)]
mod tests;
