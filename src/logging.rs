//! Logging initialization

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Build the level filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
  match EnvFilter::try_from_default_env() {
    Ok(filter) => Ok(filter),
    Err(_) => EnvFilter::try_new(&config.level).map_err(|source| Error::LogLevel {
      level: config.level.clone(),
      source,
    }),
  }
}

/// Install the global subscriber, writing to `config.file` or stdout
pub fn init(config: &LogConfig) -> Result<()> {
  let filter = env_filter(config)?;
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_thread_ids(true);

  let result = match &config.file {
    Some(path) => {
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::LogFile {
          path: path.clone(),
          source,
        })?;
      builder
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    }
    None => builder.try_init(),
  };

  result.map_err(Error::LogInit)
}
