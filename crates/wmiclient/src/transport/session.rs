//! Session transport: one long-lived agent per client.

use std::io;
use std::sync::Arc;

use tracing::{debug, warn};
use wmiclient_config::AgentConfig;

use super::state::{SessionPhase, SessionState};
use super::worker::{ProcessLauncher, Worker, WorkerLauncher};
use super::{Response, Transport, encode_request};
use crate::error::ClientError;
use crate::frame::{LineSource, read_frame};
use crate::identity::TargetIdentity;
use crate::sink::StatusSink;

/// Log target for session transport operations.
const SESSION_TARGET: &str = "wmiclient::session";

/// Keeps one agent running in session mode and exchanges framed requests
/// with it.
///
/// The agent is launched on the first request (or by [`connect`]). When a
/// request cannot be written because the agent has gone away, the agent is
/// relaunched and the write retried once. Any other failure during a
/// round-trip discards the agent; the following request starts a new one.
///
/// [`connect`]: SessionTransport::connect
pub struct SessionTransport<L = ProcessLauncher> {
    launcher: L,
    state: SessionState,
    sink: Arc<dyn StatusSink>,
    launches: usize,
}

impl SessionTransport<ProcessLauncher> {
    /// Creates a transport that launches the configured agent for `identity`.
    #[must_use]
    pub fn new(config: &AgentConfig, identity: &TargetIdentity, sink: Arc<dyn StatusSink>) -> Self {
        Self::with_launcher(ProcessLauncher::new(config, identity), sink)
    }
}

impl<L: WorkerLauncher> SessionTransport<L> {
    /// Creates a transport around a custom launcher.
    #[must_use]
    pub fn with_launcher(launcher: L, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            launcher,
            state: SessionState::Idle,
            sink,
            launches: 0,
        }
    }

    /// Launches the agent now instead of on the first request.
    ///
    /// Does nothing when an agent is already running.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LaunchFailed`] when the agent cannot be started.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        self.worker().map(|_| ())
    }

    /// Current phase of the session.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Process identifier of the running agent, if there is one.
    #[must_use]
    pub fn agent_pid(&self) -> Option<u32> {
        match &self.state {
            SessionState::Connected(worker) => worker.pid(),
            SessionState::Idle | SessionState::Failed => None,
        }
    }

    /// Number of agents launched over the transport's lifetime.
    #[must_use]
    pub const fn launch_count(&self) -> usize {
        self.launches
    }

    fn worker(&mut self) -> Result<&mut Worker, ClientError> {
        if !matches!(self.state, SessionState::Connected(_)) {
            self.relaunch()?;
        }
        match &mut self.state {
            SessionState::Connected(worker) => Ok(worker),
            SessionState::Idle | SessionState::Failed => Err(ClientError::WorkerExited),
        }
    }

    fn relaunch(&mut self) -> Result<(), ClientError> {
        self.mark_failed();
        self.sink.on_debug(&format!("calling: {}", self.launcher.describe()));
        let worker = self.launcher.launch()?;
        self.launches += 1;
        debug!(
            target: SESSION_TARGET,
            pid = ?worker.pid(),
            launches = self.launches,
            "agent session started"
        );
        self.state = SessionState::Connected(worker);
        Ok(())
    }

    /// Discards any running worker, terminating its process.
    fn mark_failed(&mut self) {
        self.state = SessionState::Failed;
    }

    fn write_request(&mut self, line: &str) -> Result<(), ClientError> {
        let written = self.worker()?.write_line(line);
        match written {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => {
                warn!(
                    target: SESSION_TARGET,
                    %error,
                    "agent pipe closed, restarting agent"
                );
                self.relaunch()?;
                self.worker()?
                    .write_line(line)
                    .map_err(|source| ClientError::TransportFailure {
                        source: Arc::new(source),
                    })
            }
            Err(error) => Err(ClientError::io(error)),
        }
    }

    fn read_response(&mut self) -> Result<Response, ClientError> {
        let sink = Arc::clone(&self.sink);
        let worker = self.worker()?;
        read_frame(&mut WorkerLines {
            worker,
            sink: sink.as_ref(),
        })
    }

    fn round_trip(&mut self, line: &str) -> Result<Response, ClientError> {
        self.write_request(line)?;
        self.read_response()
    }
}

impl<L: WorkerLauncher> Transport for SessionTransport<L> {
    fn execute(&mut self, args: &[String]) -> Result<Response, ClientError> {
        let line = encode_request(args)?;
        self.sink.on_debug(&line);
        debug!(target: SESSION_TARGET, request = %line, "sending request");

        let outcome = self.round_trip(&line);
        if let Err(error) = &outcome {
            warn!(
                target: SESSION_TARGET,
                %error,
                "discarding agent after failed request"
            );
            self.mark_failed();
        }
        outcome
    }

    fn close(&mut self) -> Result<(), ClientError> {
        if matches!(self.state, SessionState::Connected(_)) {
            debug!(target: SESSION_TARGET, "closing agent session");
        }
        self.state = SessionState::Idle;
        Ok(())
    }
}

/// Reads trimmed lines from a worker, echoing each one to the sink.
struct WorkerLines<'a> {
    worker: &'a mut Worker,
    sink: &'a dyn StatusSink,
}

impl LineSource for WorkerLines<'_> {
    fn read_line(&mut self) -> Result<String, ClientError> {
        let line = self
            .worker
            .read_line()
            .map_err(ClientError::io)?
            .ok_or(ClientError::WorkerExited)?;
        self.sink.on_debug(&line);
        Ok(line)
    }
}
