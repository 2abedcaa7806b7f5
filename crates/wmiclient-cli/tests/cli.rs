//! Integration tests for the `wmiclient` binary.
//!
//! A POSIX shell script stands in for the agent. It answers in session mode
//! when it sees the session flag and in one-shot mode otherwise, tagging its
//! output so the tests can tell which transport the configuration selected.

#![cfg(unix)]
#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clarity and assertions"
)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const AGENT: &str = r#"
for arg in "$@"; do
  [ "$arg" = "--interactive" ] && interactive=yes
done
if [ -n "$interactive" ]; then
  while IFS= read -r line; do
    case "$line" in
      '"query" "uuid"') printf '= START OUTPUT0\nSESSION-UUID\n= END OUTPUT\n' ;;
      '"service" "start" "Spooler"') printf '= ERROR 0x5 access is denied\n' ;;
      *) printf '= START STACKTRACE\nunknown request\n= END STACKTRACE\n' ;;
    esac
  done
  exit 0
fi
shift 8
case "$1 $2" in
  "query uuid") echo ONESHOT-UUID ;;
  "service start") echo "access is denied" >&2; exit 5 ;;
  *) echo "unknown request" >&2; exit 1 ;;
esac
"#;

const ENVIRONMENT: [&str; 14] = [
    "WMICLIENT_CONFIG_PATH",
    "WMICLIENT_AGENT",
    "WMICLIENT_LEADING_ARGS",
    "WMICLIENT_EXTRA_ARGS",
    "WMICLIENT_SESSION_FLAG",
    "WMICLIENT_POLL_INTERVAL_MS",
    "WMICLIENT_MODE",
    "WMICLIENT_LOG_FILTER",
    "WMICLIENT_LOG_FORMAT",
    "WMICLIENT_HOST",
    "WMICLIENT_USER",
    "WMICLIENT_PASSWORD",
    "WMICLIENT_DOMAIN",
    "RUST_LOG",
];

struct Workspace {
    config: PathBuf,
    _dir: TempDir,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("create temp dir");
    let script = dir.path().join("agent.sh");
    fs::write(&script, AGENT).expect("write agent script");
    let config = dir.path().join("wmiclient.toml");
    fs::write(
        &config,
        format!(
            "log_filter = \"warn\"\nagent = \"/bin/sh\"\nleading_args = [\"{}\"]\nmode = \"one_shot\"\npoll_interval_ms = 10\n",
            script.display()
        ),
    )
    .expect("write config");
    Workspace { config, _dir: dir }
}

fn wmiclient() -> Command {
    let mut command = cargo_bin_cmd!("wmiclient");
    for variable in ENVIRONMENT {
        command.env_remove(variable);
    }
    command
}

/// Configuration flags lead, followed by the target flags.
fn against_localhost(workspace: &Workspace, config_flags: &[&str]) -> Command {
    let mut command = wmiclient();
    command
        .arg("--config-path")
        .arg(&workspace.config)
        .args(config_flags)
        .args(["--host", "127.0.0.1", "--user", "admin", "--password", "pw"]);
    command
}

#[test]
fn help_succeeds() {
    wmiclient()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("registry"));
}

#[test]
fn missing_host_is_a_usage_error() {
    wmiclient()
        .args(["--user", "admin", "--password", "pw", "query", "uuid"])
        .assert()
        .code(2)
        .stderr(contains("--host"));
}

#[rstest]
fn unreadable_config_is_a_usage_error(workspace: Workspace) {
    fs::write(&workspace.config, "mode = \"daemon\"\n").expect("corrupt config");

    against_localhost(&workspace, &[])
        .args(["query", "uuid"])
        .assert()
        .code(2)
        .stderr(contains("failed to load configuration"));
}

#[rstest]
fn configuration_file_selects_the_transport(workspace: Workspace) {
    against_localhost(&workspace, &[])
        .args(["--output", "human", "query", "uuid"])
        .assert()
        .success()
        .stdout("ONESHOT-UUID\n");
}

#[rstest]
fn environment_overrides_the_configuration_file(workspace: Workspace) {
    against_localhost(&workspace, &[])
        .env("WMICLIENT_MODE", "session")
        .args(["--output", "human", "query", "uuid"])
        .assert()
        .success()
        .stdout("SESSION-UUID\n");
}

#[rstest]
fn flags_override_the_environment(workspace: Workspace) {
    against_localhost(&workspace, &["--mode", "one_shot"])
        .env("WMICLIENT_MODE", "session")
        .args(["--output", "human", "query", "uuid"])
        .assert()
        .success()
        .stdout("ONESHOT-UUID\n");
}

#[rstest]
#[case::one_shot("one_shot")]
#[case::session("session")]
fn classified_failures_exit_with_one(workspace: Workspace, #[case] mode: &str) {
    against_localhost(&workspace, &["--mode", mode])
        .args(["service", "start", "Spooler"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("wmiclient: ").and(contains("access is denied")));
}

#[rstest]
fn json_output_carries_the_result(workspace: Workspace) {
    against_localhost(&workspace, &[])
        .args(["--output", "json", "query", "uuid"])
        .assert()
        .success()
        .stdout(contains("\"uuid\":\"ONESHOT-UUID\"").and(contains("\"host\":\"127.0.0.1\"")));
}

#[rstest]
fn environment_names_the_configuration_file(workspace: Workspace) {
    wmiclient()
        .env("WMICLIENT_CONFIG_PATH", &workspace.config)
        .args(["--host", "127.0.0.1", "--user", "admin", "--password", "pw"])
        .args(["--output", "human", "query", "uuid"])
        .assert()
        .success()
        .stdout("ONESHOT-UUID\n");
}
