//! Command-line front end for the wmiclient protocol engine.
//!
//! The runtime splits the arguments between the configuration loader and the
//! command parser, installs telemetry, resolves the target host, and runs one
//! request through [`wmiclient::WmiClient`]. Results go to stdout; diagnostics
//! and failures go to stderr. IO streams are injected so tests can capture
//! both.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use wmiclient::{ClientError, TargetIdentity, TracingSink, WmiClient, with_client};

mod cli;
mod command;
mod config;
mod errors;
mod output;
mod telemetry;

use cli::{Cli, TargetArgs};
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
use errors::AppError;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, T, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    stdout_is_terminal: bool,
) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, stdout_is_terminal, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, T, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    stdout_is_terminal: bool,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let split = split_arguments(args.into_iter().map(Into::into).collect());
    let cli = match Cli::try_parse_from(&split.command) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let result = loader
        .load(&split.config)
        .map_err(AppError::LoadConfiguration)
        .and_then(|config| execute(cli, &config, stdout, stdout_is_terminal));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            drop(error.report(stderr));
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_usage<W: Write, E: Write>(
    error: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let rendered = error.render();
    if error.use_stderr() {
        drop(write!(stderr, "{rendered}"));
    } else {
        drop(write!(stdout, "{rendered}"));
    }
    ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(2))
}

fn execute<W: Write>(
    cli: Cli,
    config: &wmiclient_config::Config,
    stdout: &mut W,
    stdout_is_terminal: bool,
) -> Result<(), AppError> {
    telemetry::initialise(config).map_err(AppError::Telemetry)?;
    let format = cli.output.resolve(stdout_is_terminal);

    let TargetArgs {
        host,
        user,
        password,
        domain,
    } = cli.target;
    let identity =
        TargetIdentity::resolve(&host, domain, user, password).map_err(ClientError::from)?;
    let _span = telemetry::target_span(identity.host()).entered();
    let sink = Arc::new(TracingSink::new(identity.host()));
    let wmi = WmiClient::connect(identity, &config.agent_config(), sink);

    let outcome = with_client(wmi, |client| command::dispatch(client, &cli.command))?;
    output::render(&outcome, format, stdout)?;
    Ok(())
}
