//! Layering of defaults, files, environment variables, and flags.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::{fixture, rstest};
use ortho_config::OrthoConfig;
use tempfile::TempDir;
use wmiclient_config::{Config, LogFormat, TransportMode};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Holds the environment lock and restores the variables it changed.
struct EnvOverride {
    previous: Vec<(&'static str, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvOverride {
    fn lock() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        Self {
            previous: Vec::new(),
            _guard: guard,
        }
    }

    fn set(&mut self, key: &'static str, value: impl AsRef<OsStr>) {
        self.previous.push((key, std::env::var_os(key)));
        // Environment mutation is `unsafe` on edition 2024; the mutex keeps
        // these tests from racing each other.
        unsafe { std::env::set_var(key, value) };
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        for (key, previous) in self.previous.drain(..).rev() {
            match previous {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

struct ConfigFile {
    path: PathBuf,
    _dir: TempDir,
}

#[fixture]
fn config_file() -> ConfigFile {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("wmiclient.toml");
    fs::write(
        &path,
        "agent = \"/opt/agent\"\nmode = \"one_shot\"\nlog_filter = \"debug\"\n",
    )
    .expect("write config");
    ConfigFile { path, _dir: dir }
}

fn load(args: &[&OsStr]) -> Config {
    let mut argv = vec![OsString::from("wmiclient")];
    argv.extend(args.iter().map(|arg| arg.to_os_string()));
    Config::load_from_iter(argv).expect("load configuration")
}

fn config_path(path: &Path) -> [&OsStr; 2] {
    [OsStr::new("--config-path"), path.as_os_str()]
}

#[rstest]
fn defaults_apply_without_file_or_overrides() {
    let _env = EnvOverride::lock();

    let config = load(&[]);

    assert_eq!(config, Config::default());
}

#[rstest]
fn file_values_override_defaults(config_file: ConfigFile) {
    let _env = EnvOverride::lock();

    let config = load(&config_path(&config_file.path));

    assert_eq!(config.agent, PathBuf::from("/opt/agent"));
    assert_eq!(config.mode, TransportMode::OneShot);
    assert_eq!(config.log_filter, "debug");
    assert_eq!(config.log_format, LogFormat::Compact);
}

#[rstest]
fn environment_overrides_the_file(config_file: ConfigFile) {
    let mut env = EnvOverride::lock();
    env.set("WMICLIENT_MODE", "session");
    env.set("WMICLIENT_LOG_FORMAT", "json");

    let config = load(&config_path(&config_file.path));

    assert_eq!(config.mode, TransportMode::Session);
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.agent, PathBuf::from("/opt/agent"));
}

#[rstest]
fn flags_override_the_environment(config_file: ConfigFile) {
    let mut env = EnvOverride::lock();
    env.set("WMICLIENT_MODE", "session");
    env.set("WMICLIENT_AGENT", "/usr/local/bin/wmic");

    let mut args = config_path(&config_file.path).to_vec();
    args.extend([OsStr::new("--mode"), OsStr::new("one_shot")]);
    let config = load(&args);

    assert_eq!(config.mode, TransportMode::OneShot);
    assert_eq!(config.agent, PathBuf::from("/usr/local/bin/wmic"));
}

#[rstest]
fn config_path_may_come_from_the_environment(config_file: ConfigFile) {
    let mut env = EnvOverride::lock();
    env.set("WMICLIENT_CONFIG_PATH", config_file.path.as_os_str());

    let config = load(&[]);

    assert_eq!(config.agent, PathBuf::from("/opt/agent"));
}

#[rstest]
fn malformed_file_fails_to_load(config_file: ConfigFile) {
    let _env = EnvOverride::lock();
    fs::write(&config_file.path, "mode = \"daemon\"\n").expect("corrupt config");

    let mut argv = vec![OsString::from("wmiclient")];
    argv.extend(config_path(&config_file.path).map(OsStr::to_os_string));

    assert!(Config::load_from_iter(argv).is_err());
}
