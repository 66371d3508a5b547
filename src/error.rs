use std::io;

/// Errors raised while assembling and running the server
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("failed to read config file '{path}': {source}")]
  ConfigRead { path: String, source: io::Error },

  #[error("failed to parse config file '{path}': {source}")]
  ConfigParse {
    path: String,
    source: toml::de::Error,
  },

  #[error("invalid config: {0}")]
  InvalidConfig(String),

  #[error("invalid log level '{level}': {source}")]
  LogLevel {
    level: String,
    source: tracing_subscriber::filter::ParseError,
  },

  #[error("failed to open log file '{path}': {source}")]
  LogFile { path: String, source: io::Error },

  #[error("failed to initialize logging: {0}")]
  LogInit(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

  #[error(transparent)]
  Io(#[from] io::Error),

  #[error(transparent)]
  Transport(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
