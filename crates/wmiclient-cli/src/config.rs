//! Configuration loading for the CLI.
//!
//! Leading configuration flags are routed to `ortho_config`, which layers
//! them over the environment, the configuration file, and the defaults. The
//! remaining tokens go to the clap parser for the target and the command.

use std::ffi::{OsStr, OsString};
use std::sync::Arc;

use ortho_config::OrthoConfig;
use wmiclient_config::Config;

/// Flags consumed by the configuration loader.
///
/// They must appear before the target flags and the command; anything after
/// the first other token is left to the command parser.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--agent",
    "--mode",
    "--session-flag",
    "--poll-interval-ms",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<ortho_config::OrthoError>>;
}

/// Loads configuration through the `OrthoConfig` derive on [`Config`].
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<ortho_config::OrthoError>> {
        Config::load_from_iter(args.iter().cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = text
        .split_once('=')
        .map_or((&*text, false), |(flag, _)| (flag, true));
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments partitioned between the configuration loader and clap.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    /// Program name followed by the leading configuration flags.
    pub(crate) config: Vec<OsString>,
    /// Program name followed by everything else.
    pub(crate) command: Vec<OsString>,
}

/// Splits `args` at the first token that is not a configuration flag or
/// its value.
pub(crate) fn split_arguments(args: Vec<OsString>) -> ArgumentSplit {
    let mut tokens = args.into_iter();
    let Some(program) = tokens.next() else {
        return ArgumentSplit::default();
    };

    let mut config = vec![program.clone()];
    let mut command = vec![program];
    let mut pending_value = false;
    for token in tokens.by_ref() {
        if pending_value {
            config.push(token);
            pending_value = false;
            continue;
        }
        match classify(&token) {
            FlagAction::Include { needs_value } => {
                config.push(token);
                pending_value = needs_value;
            }
            FlagAction::Stop => {
                command.push(token);
                break;
            }
        }
    }
    command.extend(tokens);
    ArgumentSplit { config, command }
}
