use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;

use tokio::net::{TcpListener, lookup_host};
#[cfg(unix)]
use tokio::net::UnixListener;
#[cfg(unix)]
use tokio_stream::wrappers::UnixListenerStream;
use tokio_stream::wrappers::TcpListenerStream;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ListenConfig, Network};
use crate::error::{Error, Result};
use crate::proto::users_server::UsersServer;
use crate::service::UsersService;

enum Listener {
  Tcp(TcpListener),
  #[cfg(unix)]
  Unix(UnixListener),
}

/// Address the server is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
  Tcp(SocketAddr),
  #[cfg(unix)]
  Unix(PathBuf),
}

impl fmt::Display for LocalAddr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LocalAddr::Tcp(addr) => write!(f, "tcp://{}", addr),
      #[cfg(unix)]
      LocalAddr::Unix(path) => write!(f, "unix://{}", path.display()),
    }
  }
}

/// gRPC server for the users service
pub struct Server {
  listener: Listener,
  local_addr: LocalAddr,
  service: UsersService,
}

async fn bind_tcp(config: &ListenConfig) -> Result<TcpListener> {
  let address = config.address();
  let addr = lookup_host(&address)
    .await?
    .find(|addr| match config.network {
      Network::Tcp4 => addr.is_ipv4(),
      Network::Tcp6 => addr.is_ipv6(),
      _ => true,
    })
    .ok_or_else(|| {
      Error::InvalidConfig(format!("no {} address found for '{}'", config.network, address))
    })?;

  Ok(TcpListener::bind(addr).await?)
}

#[cfg(unix)]
fn bind_unix(path: &str) -> Result<UnixListener> {
  // A socket file left behind by a previous run makes bind fail
  match std::fs::remove_file(path) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e.into()),
  }
  Ok(UnixListener::bind(path)?)
}

impl Server {
  /// Bind the configured listener
  pub async fn bind(config: &ListenConfig, service: UsersService) -> Result<Self> {
    let (listener, local_addr) = match config.network {
      Network::Tcp | Network::Tcp4 | Network::Tcp6 => {
        let listener = bind_tcp(config).await?;
        let addr = listener.local_addr()?;
        (Listener::Tcp(listener), LocalAddr::Tcp(addr))
      }
      #[cfg(unix)]
      Network::Unix => {
        let listener = bind_unix(&config.host)?;
        (Listener::Unix(listener), LocalAddr::Unix(PathBuf::from(&config.host)))
      }
      #[cfg(not(unix))]
      Network::Unix => {
        return Err(Error::Io(io::Error::new(
          io::ErrorKind::Unsupported,
          "unix sockets are not supported on this platform",
        )));
      }
    };
    info!("gRPC server bound to {}", local_addr);

    Ok(Self {
      listener,
      local_addr,
      service,
    })
  }

  /// Get local listening address
  pub fn local_addr(&self) -> &LocalAddr {
    &self.local_addr
  }

  /// Serve requests until `shutdown` resolves, then let in-flight calls finish
  pub async fn run<F>(self, shutdown: F) -> Result<()>
  where
    F: Future<Output = ()> + Send,
  {
    info!("Server started, listening on {}", self.local_addr);

    let router = tonic::transport::Server::builder()
      .layer(TraceLayer::new_for_grpc())
      .add_service(UsersServer::new(self.service));

    match self.listener {
      Listener::Tcp(listener) => {
        router
          .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
          .await?
      }
      #[cfg(unix)]
      Listener::Unix(listener) => {
        router
          .serve_with_incoming_shutdown(UnixListenerStream::new(listener), shutdown)
          .await?
      }
    }

    info!("Server stopped");
    Ok(())
  }
}
