//! CLI argument definitions for the wmiclient binary.

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Command-line interface for driving a Windows remote-management agent.
#[derive(Parser, Debug)]
#[command(
    name = "wmiclient",
    version,
    about = "Run service, registry, process, and query requests against a Windows host",
    disable_help_subcommand = true,
    after_help = "Configuration flags go before the target flags: --config-path, --agent, \
                  --mode, --session-flag, --poll-interval-ms, --log-filter, --log-format. \
                  Each also reads WMICLIENT_<NAME>, and the file path WMICLIENT_CONFIG_PATH."
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) target: TargetArgs,
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// The remote host and the credentials used against it.
#[derive(Args, Debug, Clone)]
pub(crate) struct TargetArgs {
    /// Host name or address of the Windows machine.
    #[arg(long, env = "WMICLIENT_HOST")]
    pub(crate) host: String,
    /// User to authenticate as.
    #[arg(long, env = "WMICLIENT_USER")]
    pub(crate) user: String,
    /// Password for the user.
    #[arg(long, env = "WMICLIENT_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
    /// Authentication domain.
    #[arg(long, env = "WMICLIENT_DOMAIN", default_value = "")]
    pub(crate) domain: String,
}

/// Request families.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Controls Windows services.
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Reads and writes the registry.
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
    /// Starts and inspects processes.
    Process {
        #[command(subcommand)]
        action: ProcessAction,
    },
    /// Queries system information.
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
    /// Sends arbitrary arguments to the agent.
    Raw {
        /// Verb followed by its parameters.
        #[arg(
            value_name = "ARG",
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },
}

/// Service actions.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ServiceAction {
    /// Starts a service.
    Start { name: String },
    /// Stops a service.
    Stop { name: String },
    /// Prints a service's status.
    Status { name: String },
}

/// Registry actions.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum RegistryAction {
    /// Reads a value.
    Get {
        path: String,
        key: String,
        /// Prints a failed lookup instead of reporting an error.
        #[arg(long)]
        raw: bool,
    },
    /// Writes a value; no values writes an empty string.
    Set {
        path: String,
        key: String,
        values: Vec<String>,
    },
    /// Creates a key.
    Create { path: String, key: String },
}

/// Process actions.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ProcessAction {
    /// Starts a process from a command line.
    Create { command: String },
    /// Prints the status of a process.
    Status { pid: u32 },
}

/// System queries.
#[derive(Subcommand, Debug, Clone, Copy)]
pub(crate) enum QueryAction {
    /// Prints the system UUID.
    Uuid,
    /// Lists network interfaces.
    Network,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const TARGET: [&str; 7] = [
        "wmiclient",
        "--host",
        "10.0.0.5",
        "--user",
        "admin",
        "--password",
        "pw",
    ];

    fn parse(tail: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(TARGET.iter().chain(tail))
    }

    #[rstest]
    fn parses_registry_get_with_raw_flag() {
        let cli = parse(&["registry", "get", "SOFTWARE\\Vendor", "Version", "--raw"])
            .expect("parse");

        match cli.command {
            CliCommand::Registry {
                action: RegistryAction::Get { path, key, raw },
            } => {
                assert_eq!(path, "SOFTWARE\\Vendor");
                assert_eq!(key, "Version");
                assert!(raw);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.target.domain, "");
    }

    #[rstest]
    fn raw_accepts_hyphenated_arguments() {
        let cli = parse(&["raw", "process", "create", "--flag"]).expect("parse");

        match cli.command {
            CliCommand::Raw { args } => assert_eq!(args, vec!["process", "create", "--flag"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[rstest]
    #[case::bad_pid(&["process", "status", "not-a-pid"])]
    #[case::missing_raw_args(&["raw"])]
    fn rejects_invalid_arguments(#[case] tail: &[&str]) {
        assert!(parse(tail).is_err());
    }
}
