//! Server configuration.
//!
//! Values come from an optional TOML file and the command line; CLI
//! arguments take precedence over file values.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use wsecho_server::ServerConfig;

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "wsecho", version, about = "WebSocket echo server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:3000)
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Do not send a welcome notice when a session opens
    #[arg(long)]
    pub no_welcome: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_true")]
    pub welcome: bool,
    /// Queued outbound bytes at which a session reports backpressure.
    #[serde(default = "default_backpressure_threshold")]
    pub backpressure_threshold: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            welcome: default_true(),
            backpressure_threshold: default_backpressure_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> SocketAddr {
    ServerConfig::default().listen
}

fn default_true() -> bool {
    true
}

fn default_backpressure_threshold() -> usize {
    ServerConfig::default().backpressure_threshold
}

fn default_log_level() -> String {
    "info".into()
}

/// Final resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub welcome: bool,
    pub log_level: String,
}

impl Config {
    /// Parses the command line and loads the file it names, if any.
    pub fn load() -> anyhow::Result<Self> {
        let cli = CliArgs::parse();
        let file = match cli.config.as_deref() {
            Some(path) => read_file(path)?,
            None => TomlConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    fn merge(cli: CliArgs, file: TomlConfig) -> Self {
        Self {
            server: ServerConfig {
                listen: cli.listen.unwrap_or(file.server.listen),
                backpressure_threshold: file.server.backpressure_threshold,
            },
            welcome: file.server.welcome && !cli.no_welcome,
            log_level: cli.log_level.unwrap_or(file.logging.level),
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<TomlConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}
