//! A live session-mode agent and the launcher that creates it.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Stdio};
use std::sync::Arc;

use tracing::debug;
use wmiclient_config::AgentConfig;

use super::lifecycle::terminate_child;
use crate::agent::AgentCommand;
use crate::error::ClientError;
use crate::identity::TargetIdentity;

/// Log target for worker launches.
const WORKER_TARGET: &str = "wmiclient::worker";

/// Starts session-mode agents.
pub trait WorkerLauncher: Send {
    /// Launches a fresh agent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LaunchFailed`] when the agent cannot be started.
    fn launch(&mut self) -> Result<Worker, ClientError>;

    /// The command line being launched, safe to log.
    fn describe(&self) -> String;
}

/// One running agent: its request pipe, its response pipe, and optionally
/// the process behind them.
///
/// Dropping a worker closes its request pipe and terminates the process.
pub struct Worker {
    reader: Box<dyn BufRead + Send>,
    writer: Option<Box<dyn Write + Send>>,
    process: Option<Child>,
}

impl Worker {
    /// Wraps a pair of pipes with no process attached.
    #[must_use]
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            reader,
            writer: Some(writer),
            process: None,
        }
    }

    /// Attaches the process that owns the pipes.
    #[must_use]
    pub fn with_process(mut self, process: Child) -> Self {
        self.process = Some(process);
        self
    }

    /// Process identifier, if a process is attached.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }

    /// Writes `line` followed by a newline and flushes.
    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Reads one line with surrounding whitespace trimmed.
    ///
    /// Returns `None` at end of stream.
    pub(crate) fn read_line(&mut self) -> io::Result<Option<String>> {
        read_trimmed_line(&mut self.reader)
    }
}

/// Reads one trimmed line from `reader`.
///
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
/// Returns `None` at end of stream.
pub(super) fn read_trimmed_line<R: BufRead + ?Sized>(
    reader: &mut R,
) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    if reader.read_until(b'\n', &mut bytes)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).trim().to_owned()))
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.writer.take());
        if let Some(mut process) = self.process.take() {
            terminate_child(&mut process);
        }
    }
}

/// Launches the configured agent program in session mode.
///
/// The agent's stdin and stdout carry the protocol; its stderr is inherited
/// so diagnostics reach the operator.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    command: AgentCommand,
}

impl ProcessLauncher {
    /// Creates a launcher for `identity` using `config`.
    #[must_use]
    pub fn new(config: &AgentConfig, identity: &TargetIdentity) -> Self {
        Self {
            command: AgentCommand::session(config, identity),
        }
    }

    /// The command line this launcher runs.
    #[must_use]
    pub const fn command(&self) -> &AgentCommand {
        &self.command
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&mut self) -> Result<Worker, ClientError> {
        debug!(target: WORKER_TARGET, command = %self.command, "launching agent");
        let mut child = self
            .command
            .to_command(&[])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ClientError::LaunchFailed {
                command: self.command.to_string(),
                source: Arc::new(source),
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            terminate_child(&mut child);
            return Err(ClientError::io(io::Error::other(
                "agent pipes were not captured",
            )));
        };
        debug!(target: WORKER_TARGET, pid = child.id(), "agent launched");
        Ok(Worker::new(Box::new(BufReader::new(stdout)), Box::new(stdin)).with_process(child))
    }

    fn describe(&self) -> String {
        self.command.to_string()
    }
}
