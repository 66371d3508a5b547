use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crud_users::config::Config;
use crud_users::server::Server;
use crud_users::service::UsersService;
use crud_users::store::MemoryStorage;
use tracing::{info, info_span, warn};

#[derive(Parser, Debug)]
#[command(name = "crud-users", version, about = "User CRUD service over gRPC")]
struct Args {
  /// Path to a TOML config file
  #[arg(short, long)]
  config: Option<String>,

  /// Listen host, overrides the config file
  #[arg(long)]
  host: Option<String>,

  /// Listen port, overrides the config file
  #[arg(long)]
  port: Option<u16>,
}

impl Args {
  fn load_config(&self) -> anyhow::Result<Config> {
    let mut config = match &self.config {
      Some(path) => Config::from_file(path)?,
      None => Config::default(),
    };
    if let Some(host) = &self.host {
      config.listen.host = host.clone();
    }
    if let Some(port) = self.port {
      config.listen.port = port;
    }
    config.validate()?;
    Ok(config)
  }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!("Failed to listen for Ctrl-C: {}", e);
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!("Failed to listen for SIGTERM: {}", e);
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  let config = args.load_config().context("failed to load configuration")?;

  crud_users::logging::init(&config.log).context("failed to initialize logging")?;

  info!("Starting crud-users gRPC service");
  info!("Version: {}", env!("CARGO_PKG_VERSION"));

  let storage = Arc::new(MemoryStorage::new());
  let service = UsersService::new(info_span!("users"), storage);

  let server = Server::bind(&config.listen, service)
    .await
    .with_context(|| format!("failed to bind {} {}", config.listen.network, config.listen.address()))?;
  info!("Server listening on: {}", server.local_addr());

  server.run(shutdown_signal()).await.context("server failed")?;

  Ok(())
}
