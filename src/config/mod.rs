use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

use crate::error::{Error, Result};

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Socket family the server listens on
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
  /// TCP over whichever family `host` resolves to first
  #[default]
  Tcp,
  /// TCP over IPv4 only
  Tcp4,
  /// TCP over IPv6 only
  Tcp6,
  /// Unix domain socket, `host` is the socket path
  Unix,
}

impl fmt::Display for Network {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Network::Tcp => "tcp",
      Network::Tcp4 => "tcp4",
      Network::Tcp6 => "tcp6",
      Network::Unix => "unix",
    };
    f.write_str(name)
  }
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ListenConfig {
  #[serde(default)]
  pub network: Network,
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

fn default_host() -> String {
  "localhost".to_string()
}

fn default_port() -> u16 {
  2250
}

impl ListenConfig {
  /// Address to bind: `host:port`, or just the path for unix sockets
  pub fn address(&self) -> String {
    match self.network {
      Network::Unix => self.host.clone(),
      _ => format!("{}:{}", self.host, self.port),
    }
  }
}

impl Default for ListenConfig {
  fn default() -> Self {
    Self {
      network: Network::default(),
      host: default_host(),
      port: default_port(),
    }
  }
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
  /// Listener configuration
  #[serde(default)]
  pub listen: ListenConfig,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self> {
    let config_str = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
      path: path.to_string(),
      source,
    })?;

    let config: Config = toml::from_str(&config_str).map_err(|source| Error::ConfigParse {
      path: path.to_string(),
      source,
    })?;

    config.validate()?;

    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.listen.host.is_empty() {
      return Err(Error::InvalidConfig("listen.host must not be empty".to_string()));
    }
    if self.listen.network != Network::Unix && self.listen.port == 0 {
      return Err(Error::InvalidConfig(format!(
        "listen.port must be set for network '{}'",
        self.listen.network
      )));
    }
    Ok(())
  }
}
