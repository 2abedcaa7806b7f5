//! One-shot transport: a fresh agent process per request.

use std::io::{self, BufReader, Read};
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};
use wmiclient_config::AgentConfig;

use super::worker::read_trimmed_line;
use super::{Response, Transport};
use crate::agent::AgentCommand;
use crate::codes::UNKNOWN_CODE;
use crate::error::ClientError;
use crate::identity::TargetIdentity;
use crate::sink::StatusSink;

/// Log target for one-shot transport operations.
const ONESHOT_TARGET: &str = "wmiclient::oneshot";

const STATUS_WAITING: &str = "Waiting for response from remote Windows server";
const STATUS_SUCCEEDED: &str = "WMI call completed successfully";
const STATUS_FAILED: &str = "Error in WMI call";

type LinesHandle = JoinHandle<io::Result<Vec<String>>>;

/// Runs the agent once per request and reports its exit status.
///
/// The request arguments are appended to the agent's command line. The exit
/// code becomes the result code, and stdout and stderr become the output and
/// error lines with blank lines dropped.
pub struct OneShotTransport {
    command: AgentCommand,
    poll_interval: Duration,
    sink: Arc<dyn StatusSink>,
}

impl OneShotTransport {
    /// Creates a transport that runs the configured agent for `identity`.
    #[must_use]
    pub fn new(config: &AgentConfig, identity: &TargetIdentity, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            command: AgentCommand::new(config, identity),
            poll_interval: config.poll_interval(),
            sink,
        }
    }

    fn spawn(&self, args: &[String]) -> Result<Child, ClientError> {
        self.command
            .to_command(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ClientError::LaunchFailed {
                command: self.command.display_with(args),
                source: Arc::new(source),
            })
    }

    fn wait(&self, child: &mut Child) -> Result<i64, ClientError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(target: ONESHOT_TARGET, pid = child.id(), ?status, "agent exited");
                    return Ok(status.code().map_or(UNKNOWN_CODE, i64::from));
                }
                Ok(None) => {
                    self.sink.on_status(STATUS_WAITING);
                    thread::sleep(self.poll_interval);
                }
                Err(error) => {
                    warn!(
                        target: ONESHOT_TARGET,
                        pid = child.id(),
                        %error,
                        "failed to poll agent, killing it"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(ClientError::io(error));
                }
            }
        }
    }
}

impl Transport for OneShotTransport {
    fn execute(&mut self, args: &[String]) -> Result<Response, ClientError> {
        let rendered = self.command.display_with(args);
        self.sink.on_debug(&format!("calling: {rendered}"));
        debug!(target: ONESHOT_TARGET, command = %rendered, "spawning agent");

        let mut child = self.spawn(args)?;
        let stdout = child.stdout.take().map(collect_lines);
        let stderr = child.stderr.take().map(collect_lines);

        let code = self.wait(&mut child)?;
        self.sink.on_status(if code == 0 {
            STATUS_SUCCEEDED
        } else {
            STATUS_FAILED
        });

        let output = join_lines(stdout)?;
        let error = join_lines(stderr)?;
        Ok(Response::new(code, output, error))
    }

    fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Drains a pipe on a background thread so the agent never blocks on a full
/// pipe while the caller polls.
fn collect_lines<R: Read + Send + 'static>(pipe: R) -> LinesHandle {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut lines = Vec::new();
        while let Some(line) = read_trimmed_line(&mut reader)? {
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    })
}

fn join_lines(handle: Option<LinesHandle>) -> Result<Vec<String>, ClientError> {
    let Some(reader) = handle else {
        return Ok(Vec::new());
    };
    match reader.join() {
        Ok(lines) => lines.map_err(ClientError::io),
        Err(_) => Err(ClientError::io(io::Error::other(
            "agent output reader panicked",
        ))),
    }
}
