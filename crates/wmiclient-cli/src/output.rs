//! Rendering of request outcomes for humans and machines.
//!
//! Human output prints the agent's output lines as-is. JSON output emits one
//! document per invocation carrying the host, the result code, and both line
//! sequences, plus the parsed payload for query commands.

use std::io::{self, Write};
use std::net::IpAddr;

use clap::ValueEnum;
use serde::Serialize;
use wmiclient::{ClientError, NetworkInterface, RequestResult};

/// Output format selection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ResolvedOutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    pub(crate) const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}

/// What a dispatched command produced.
#[derive(Debug)]
pub(crate) enum Outcome {
    Result(RequestResult),
    Uuid {
        result: RequestResult,
        uuid: String,
    },
    Network {
        result: RequestResult,
        interfaces: Vec<NetworkInterface>,
    },
}

impl Outcome {
    const fn result(&self) -> &RequestResult {
        match self {
            Self::Result(result)
            | Self::Uuid { result, .. }
            | Self::Network { result, .. } => result,
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(flatten)]
    result: &'a RequestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interfaces: Option<Vec<InterfaceDocument<'a>>>,
}

#[derive(Serialize)]
struct InterfaceDocument<'a> {
    #[serde(flatten)]
    interface: &'a NetworkInterface,
    cidr: Option<u8>,
    is_v4: bool,
}

impl<'a> From<&'a NetworkInterface> for InterfaceDocument<'a> {
    fn from(interface: &'a NetworkInterface) -> Self {
        Self {
            interface,
            cidr: interface.cidr().ok(),
            is_v4: interface.is_v4(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RenderError {
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
    #[error("failed to serialise output: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Writes `outcome` to `out` in the requested format.
pub(crate) fn render<W: Write>(
    outcome: &Outcome,
    format: ResolvedOutputFormat,
    out: &mut W,
) -> Result<(), RenderError> {
    match format {
        ResolvedOutputFormat::Human => render_human(outcome, out)?,
        ResolvedOutputFormat::Json => {
            let document = Document {
                result: outcome.result(),
                uuid: match outcome {
                    Outcome::Uuid { uuid, .. } => Some(uuid.as_str()),
                    _ => None,
                },
                interfaces: match outcome {
                    Outcome::Network { interfaces, .. } => {
                        Some(interfaces.iter().map(InterfaceDocument::from).collect())
                    }
                    _ => None,
                },
            };
            serde_json::to_writer(&mut *out, &document)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn render_human<W: Write>(outcome: &Outcome, out: &mut W) -> io::Result<()> {
    match outcome {
        Outcome::Result(result) => {
            for line in result.output() {
                writeln!(out, "{line}")?;
            }
            if !result.is_success() {
                writeln!(out, "result code: {}", result.code())?;
                for line in result.error() {
                    writeln!(out, "  {line}")?;
                }
            }
        }
        Outcome::Uuid { uuid, .. } => writeln!(out, "{uuid}")?,
        Outcome::Network { interfaces, .. } => {
            for interface in interfaces {
                render_interface(interface, out)?;
            }
        }
    }
    Ok(())
}

fn render_interface<W: Write>(interface: &NetworkInterface, out: &mut W) -> io::Result<()> {
    let address = interface.cidr().map_or_else(
        |_| format!("{} (netmask {})", interface.ip_address, interface.netmask),
        |prefix| format!("{}/{prefix}", interface.ip_address),
    );
    let marker = if interface.required { " *" } else { "" };
    writeln!(
        out,
        "{}\t{address}\t{}{marker}",
        interface.name, interface.dns_name
    )
}

/// Writes a failed request's message and the agent's error lines.
pub(crate) fn render_failure<W: Write>(error: &ClientError, stderr: &mut W) -> io::Result<()> {
    writeln!(stderr, "wmiclient: {error}")?;
    if let Some(result) = error.result() {
        let host: IpAddr = result.host();
        writeln!(stderr, "  host: {host}, result code: {}", result.code())?;
        for line in result.error() {
            writeln!(stderr, "  {line}")?;
        }
    }
    Ok(())
}
