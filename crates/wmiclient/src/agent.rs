//! Agent command-line assembly.
//!
//! The agent takes its target and credentials as a fixed flag sequence:
//!
//! ```text
//! <program> [leading args] --host <addr> --user <user> --password <password>
//!     --domain <domain> [extra args] [session flag | request args]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use wmiclient_config::AgentConfig;

use crate::identity::TargetIdentity;

/// Placeholder used when rendering secrets in logs.
const REDACTED: &str = "********";

/// Fixed credential template; placeholders are replaced from the identity.
const CREDENTIAL_TEMPLATE: [&str; 8] = [
    "--host",
    "{host}",
    "--user",
    "{user}",
    "--password",
    "{password}",
    "--domain",
    "{domain}",
];

#[derive(Clone, PartialEq, Eq)]
enum Argument {
    Plain(String),
    Secret(String),
}

impl Argument {
    fn value(&self) -> &str {
        match self {
            Self::Plain(value) | Self::Secret(value) => value,
        }
    }

    fn rendered(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Secret(_) => REDACTED,
        }
    }
}

/// The agent program and its argument vector for one identity.
///
/// `Display` renders the command with the password masked, so it is safe to
/// log.
#[derive(Clone, PartialEq, Eq)]
pub struct AgentCommand {
    program: PathBuf,
    args: Vec<Argument>,
}

impl AgentCommand {
    /// Builds the one-shot command line: credentials but no session flag.
    #[must_use]
    pub fn new(config: &AgentConfig, identity: &TargetIdentity) -> Self {
        let mut args: Vec<Argument> = config
            .leading_args
            .iter()
            .cloned()
            .map(Argument::Plain)
            .collect();
        args.extend(
            CREDENTIAL_TEMPLATE
                .iter()
                .map(|token| substitute(token, identity)),
        );
        args.extend(config.extra_args.iter().cloned().map(Argument::Plain));
        Self {
            program: config.program.clone(),
            args,
        }
    }

    /// Builds the session command line: credentials plus the session flag.
    #[must_use]
    pub fn session(config: &AgentConfig, identity: &TargetIdentity) -> Self {
        let mut command = Self::new(config, identity);
        command
            .args
            .push(Argument::Plain(config.session_flag.clone()));
        command
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, unredacted.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(Argument::value)
    }

    /// Creates a [`Command`] with `request` appended after the fixed
    /// arguments. Stdio is left for the caller to configure.
    #[must_use]
    pub fn to_command(&self, request: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args()).args(request);
        command
    }

    /// Renders the command with `request` appended, password masked.
    #[must_use]
    pub fn display_with(&self, request: &[String]) -> String {
        let mut rendered = self.to_string();
        for argument in request {
            rendered.push(' ');
            rendered.push_str(argument);
        }
        rendered
    }
}

fn substitute(token: &str, identity: &TargetIdentity) -> Argument {
    match token {
        "{host}" => Argument::Plain(identity.host().to_string()),
        "{user}" => Argument::Plain(identity.user().to_owned()),
        "{password}" => Argument::Secret(identity.password().to_owned()),
        "{domain}" => Argument::Plain(identity.domain().to_owned()),
        literal => Argument::Plain(literal.to_owned()),
    }
}

impl fmt::Display for AgentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for argument in &self.args {
            write!(f, " {}", argument.rendered())?;
        }
        Ok(())
    }
}

impl fmt::Debug for AgentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AgentCommand").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn identity() -> TargetIdentity {
        TargetIdentity::new(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            "CORP",
            "admin",
            "s3cret",
        )
    }

    #[rstest]
    fn one_shot_command_substitutes_credentials(identity: TargetIdentity) {
        let command = AgentCommand::new(&AgentConfig::default(), &identity);

        assert_eq!(command.program(), Path::new("/usr/bin/wmic"));
        assert_eq!(
            command.args().collect::<Vec<_>>(),
            vec![
                "--host", "10.0.0.5", "--user", "admin", "--password", "s3cret", "--domain",
                "CORP"
            ]
        );
    }

    #[rstest]
    fn session_command_appends_session_flag(identity: TargetIdentity) {
        let config = AgentConfig::for_program("/bin/sh")
            .with_leading_args(["agent.sh"])
            .with_extra_args(["--debug"]);

        let command = AgentCommand::session(&config, &identity);
        let args: Vec<_> = command.args().collect();

        assert_eq!(args.first(), Some(&"agent.sh"));
        assert_eq!(args.get(args.len() - 2), Some(&"--debug"));
        assert_eq!(args.last(), Some(&"--interactive"));
    }

    #[rstest]
    fn display_masks_the_password(identity: TargetIdentity) {
        let command = AgentCommand::new(&AgentConfig::default(), &identity);
        let rendered = command.display_with(&["query".to_owned(), "uuid".to_owned()]);

        assert!(!rendered.contains("s3cret"), "password leaked: {rendered}");
        assert!(rendered.contains("--password ********"));
        assert!(rendered.ends_with("query uuid"));
        assert!(!format!("{command:?}").contains("s3cret"));
    }
}
