use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fixed request payload. Every round-trip writes and reads back exactly this many bytes.
pub const DEFAULT_MESSAGE: &[u8; 16] = b"0123456789ABCDEF";

pub const DEFAULT_TARGET: &str = "127.0.0.1:7777";
pub const DEFAULT_CONNECTIONS: usize = 10;
pub const DEFAULT_DURATION_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Command-line arguments. `-h` selects the target, so help is long-only.
#[derive(Parser, Debug)]
#[command(name = "echo-bench")]
#[command(about = "TCP echo load testing", long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Number of concurrent connections
    #[arg(short = 'c', long)]
    pub connections: Option<usize>,

    /// Run duration in seconds
    #[arg(short = 'd', long)]
    pub duration: Option<u64>,

    /// Connection operations timeout in seconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Target server address (host:port)
    #[arg(short = 'h', long = "host")]
    pub target: Option<String>,

    /// Path to TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Disable the console progress spinner
    #[arg(long)]
    pub no_progress: bool,

    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target")]
    pub address: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            address: default_target(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_connections")]
    pub connections: usize,
    #[serde(default = "default_duration")]
    pub duration_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            connections: default_connections(),
            duration_secs: default_duration(),
            timeout_secs: default_timeout(),
            progress: default_progress(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_connections() -> usize {
    DEFAULT_CONNECTIONS
}

fn default_duration() -> u64 {
    DEFAULT_DURATION_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_progress() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))?;
        Ok(config)
    }
}

/// Resolved run configuration. Built once before the run and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: String,
    pub connections: usize,
    pub duration_secs: u64,
    pub timeout_secs: u64,
    pub message: Vec<u8>,
    pub progress: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: default_target(),
            connections: DEFAULT_CONNECTIONS,
            duration_secs: DEFAULT_DURATION_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            message: DEFAULT_MESSAGE.to_vec(),
            progress: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Parse the process arguments, exiting on `--help` or bad flags.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    pub fn try_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = CliArgs::try_parse_from(args)?;
        Self::from_cli(cli)
    }

    /// Merge CLI flags over the optional TOML file; CLI wins.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let file = match cli.config {
            Some(ref path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        Ok(Config {
            target: cli.target.unwrap_or(file.target.address),
            connections: cli.connections.unwrap_or(file.run.connections),
            duration_secs: cli.duration.unwrap_or(file.run.duration_secs),
            timeout_secs: cli.timeout.unwrap_or(file.run.timeout_secs),
            message: DEFAULT_MESSAGE.to_vec(),
            progress: !cli.no_progress && file.run.progress,
            log_level: cli.log_level.unwrap_or(file.logging.level),
        })
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn message_len(&self) -> usize {
        self.message.len()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    TomlParse(PathBuf, #[source] toml::de::Error),
    #[error(transparent)]
    Cli(#[from] clap::Error),
}
