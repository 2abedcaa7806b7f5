//! Request dispatcher and convenience calls.

use std::sync::Arc;

use tracing::{debug, warn};
use wmiclient_config::{AgentConfig, TransportMode};

use crate::codes::{ClassifiedError, CodeTable, ErrorKind};
use crate::error::ClientError;
use crate::identity::TargetIdentity;
use crate::network::{NetworkInterface, parse_interfaces};
use crate::result::RequestResult;
use crate::sink::StatusSink;
use crate::transport::{OneShotTransport, SessionTransport, Transport};

/// Log target for dispatcher operations.
const CLIENT_TARGET: &str = "wmiclient::client";

/// How [`WmiClient::registry_get_key`] treats a non-zero result code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Classify the code and return the failure.
    #[default]
    Raise,
    /// Return the result as is; the caller inspects the code.
    ReturnRaw,
}

/// Sends requests for one target identity over a transport and classifies
/// non-zero result codes.
///
/// Requests take `&mut self`, so a client never has more than one request in
/// flight. Dropping the client closes its transport.
pub struct WmiClient<T: Transport = Box<dyn Transport + Send>> {
    identity: TargetIdentity,
    transport: T,
    codes: CodeTable,
}

impl WmiClient {
    /// Creates a client using the transport strategy selected by `config`.
    ///
    /// No agent is started until the first request.
    #[must_use]
    pub fn connect(
        identity: TargetIdentity,
        config: &AgentConfig,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        debug!(
            target: CLIENT_TARGET,
            host = %identity.host(),
            mode = %config.mode,
            "creating client"
        );
        let transport: Box<dyn Transport + Send> = match config.mode {
            TransportMode::Session => Box::new(SessionTransport::new(config, &identity, sink)),
            TransportMode::OneShot => Box::new(OneShotTransport::new(config, &identity, sink)),
        };
        Self::with_transport(identity, transport)
    }
}

impl<T: Transport> WmiClient<T> {
    /// Creates a client over an existing transport.
    #[must_use]
    pub fn with_transport(identity: TargetIdentity, transport: T) -> Self {
        Self {
            identity,
            transport,
            codes: CodeTable::default(),
        }
    }

    /// Replaces the code table used for classification.
    #[must_use]
    pub fn with_code_table(mut self, codes: CodeTable) -> Self {
        self.codes = codes;
        self
    }

    /// The identity every request targets.
    #[must_use]
    pub const fn identity(&self) -> &TargetIdentity {
        &self.identity
    }

    /// The underlying transport.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sends a request and classifies a non-zero result code.
    ///
    /// # Errors
    ///
    /// Returns transport failures, or [`ClientError::Classified`] when the
    /// agent reports a non-zero code.
    pub fn request(&mut self, args: &[&str]) -> Result<RequestResult, ClientError> {
        let result = self.request_raw(args)?;
        self.check(result)
    }

    /// Sends a request and returns the result whatever its code.
    ///
    /// # Errors
    ///
    /// Returns transport failures only.
    pub fn request_raw(&mut self, args: &[&str]) -> Result<RequestResult, ClientError> {
        let owned: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        debug!(target: CLIENT_TARGET, args = ?owned, "dispatching request");
        let response = self.transport.execute(&owned)?;
        debug!(
            target: CLIENT_TARGET,
            code = response.code,
            output_lines = response.output.len(),
            error_lines = response.error.len(),
            "request completed"
        );
        Ok(RequestResult::new(
            self.identity.host(),
            response.code,
            response.output,
            response.error,
        ))
    }

    fn check(&self, result: RequestResult) -> Result<RequestResult, ClientError> {
        if result.is_success() {
            return Ok(result);
        }
        Err(self.codes.error(result).into())
    }

    /// Starts a service.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn service_start(&mut self, name: &str) -> Result<RequestResult, ClientError> {
        self.request(&["service", "start", name])
    }

    /// Stops a service.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn service_stop(&mut self, name: &str) -> Result<RequestResult, ClientError> {
        self.request(&["service", "stop", name])
    }

    /// Queries a service's status.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn service_query(&mut self, name: &str) -> Result<RequestResult, ClientError> {
        self.request(&["service", "getstatus", name])
    }

    /// Reads a registry value.
    ///
    /// With [`ErrorPolicy::ReturnRaw`] a non-zero code is returned in the
    /// result instead of being raised, so callers can probe for absent keys.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn registry_get_key(
        &mut self,
        path: &str,
        key: &str,
        policy: ErrorPolicy,
    ) -> Result<RequestResult, ClientError> {
        let result = self.request_raw(&["registry", "getkey", path, key])?;
        match policy {
            ErrorPolicy::Raise => self.check(result),
            ErrorPolicy::ReturnRaw => Ok(result),
        }
    }

    /// Writes a registry value. An empty `values` writes one empty string.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn registry_set_key(
        &mut self,
        path: &str,
        key: &str,
        values: &[&str],
    ) -> Result<RequestResult, ClientError> {
        let mut args = vec!["registry", "setkey", path, key];
        if values.is_empty() {
            args.push("");
        } else {
            args.extend_from_slice(values);
        }
        self.request(&args)
    }

    /// Creates a registry key.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn registry_create_key(
        &mut self,
        path: &str,
        key: &str,
    ) -> Result<RequestResult, ClientError> {
        self.request(&["registry", "createkey", path, key])
    }

    /// Starts a process on the remote host.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn process_create(&mut self, command: &str) -> Result<RequestResult, ClientError> {
        self.request(&["process", "create", command])
    }

    /// Queries a remote process by id.
    ///
    /// # Errors
    ///
    /// See [`WmiClient::request`].
    pub fn process_status(&mut self, pid: u32) -> Result<RequestResult, ClientError> {
        self.request(&["process", "status", &pid.to_string()])
    }

    /// Returns the remote system's UUID.
    ///
    /// # Errors
    ///
    /// Returns a [`ErrorKind::Unknown`] classified failure unless the agent
    /// printed exactly one line, plus the failures of
    /// [`WmiClient::request`].
    pub fn query_uuid(&mut self) -> Result<(RequestResult, String), ClientError> {
        let result = self.request(&["query", "uuid"])?;
        if let [uuid] = result.output() {
            let value = uuid.clone();
            return Ok((result, value));
        }
        Err(ClassifiedError::new(
            ErrorKind::Unknown,
            "found incorrect number of uuids",
            result,
        )
        .into())
    }

    /// Lists the remote host's network interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedOutput`] for unparsable lines, plus
    /// the failures of [`WmiClient::request`].
    pub fn query_network(
        &mut self,
    ) -> Result<(RequestResult, Vec<NetworkInterface>), ClientError> {
        let result = self.request(&["query", "network"])?;
        let interfaces = parse_interfaces(result.output(), self.identity.host())?;
        Ok((result, interfaces))
    }

    /// Releases the transport's agent. The client remains usable.
    ///
    /// # Errors
    ///
    /// Returns the transport's close failure.
    pub fn close(&mut self) -> Result<(), ClientError> {
        debug!(target: CLIENT_TARGET, host = %self.identity.host(), "closing client");
        self.transport.close()
    }
}

impl<T: Transport> Drop for WmiClient<T> {
    fn drop(&mut self) {
        if let Err(error) = self.transport.close() {
            warn!(target: CLIENT_TARGET, %error, "failed to close transport on drop");
        }
    }
}

/// Runs `operation` with `client` and closes the client afterwards.
///
/// The client is closed whether or not `operation` succeeds. A close failure
/// is reported only when `operation` itself succeeded.
///
/// # Errors
///
/// Returns the operation's error, or the close failure.
pub fn with_client<T, R, E, F>(mut client: WmiClient<T>, operation: F) -> Result<R, E>
where
    T: Transport,
    E: From<ClientError>,
    F: FnOnce(&mut WmiClient<T>) -> Result<R, E>,
{
    let outcome = operation(&mut client);
    let closed = client.close();
    let value = outcome?;
    closed?;
    Ok(value)
}
