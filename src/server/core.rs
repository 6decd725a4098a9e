//! Server and its running handle.
//!
//! # Example
//!
//! ```ignore
//! use bidi_bridge::Server;
//!
//! let handle = Server::builder()
//!     .launcher(MyLauncher::default())
//!     .build()?
//!     .listen()
//!     .await?;
//!
//! println!("listening on {}", handle.ws_url());
//! // ...
//! handle.shutdown().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::Launcher;
use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::remote::RemoteSerializer;
use crate::transport::{self, ConnectionConfig, Listener, OriginPolicy};

use super::builder::ServerBuilder;
use super::options::LaunchOptions;

// ============================================================================
// Constants
// ============================================================================

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

// ============================================================================
// Types
// ============================================================================

/// Running connection tasks by id.
type ConnectionMap = Arc<Mutex<FxHashMap<ConnectionId, JoinHandle<()>>>>;

/// Validated server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Listen address.
    pub bind_ip: IpAddr,
    /// Listen port; 0 means OS-assigned.
    pub port: u16,
    /// Options for every browser launch.
    pub launch_options: LaunchOptions,
    /// Default remote value depth.
    pub serialization_depth: u32,
    /// Handshake origin policy.
    pub origin_policy: OriginPolicy,
}

// ============================================================================
// Server
// ============================================================================

/// A configured, not yet listening bridge server.
pub struct Server {
    options: ServerOptions,
    launcher: Arc<dyn Launcher>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub(crate) fn new(options: ServerOptions, launcher: Arc<dyn Launcher>) -> Self {
        Self { options, launcher }
    }

    /// Returns the validated options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Binds and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if binding fails.
    pub async fn listen(self) -> Result<ServerHandle> {
        let listener = Listener::bind(self.options.bind_ip, self.options.port).await?;
        let local_addr = listener.local_addr();

        if self.options.origin_policy.is_allow_all() {
            warn!(
                %local_addr,
                "Origin policy allows every origin; do not expose this server to untrusted networks"
            );
        }

        let config = Arc::new(ConnectionConfig {
            launcher: self.launcher,
            launch_options: self.options.launch_options,
            serializer: RemoteSerializer::new(self.options.serialization_depth),
        });
        let policy = Arc::new(self.options.origin_policy);
        let connections = ConnectionMap::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let accept_task = tokio::spawn(accept_loop(
            listener,
            config,
            policy,
            Arc::clone(&connections),
            shutdown_rx,
        ));

        info!(%local_addr, "Server is listening");

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            connections,
            accept_task,
        })
    }
}

// ============================================================================
// ServerHandle
// ============================================================================

/// A listening server.
///
/// Dropping the handle also stops the server, without waiting for sessions
/// to be torn down. Call [`shutdown`](Self::shutdown) to wait.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    connections: ConnectionMap,
    accept_task: JoinHandle<()>,
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("local_addr", &self.local_addr)
            .field("connection_count", &self.connection_count())
            .finish_non_exhaustive()
    }
}

impl ServerHandle {
    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL clients connect to.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Number of open client connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Stops accepting, closes every connection and waits for their
    /// sessions to be torn down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.accept_task.await;

        let tasks: Vec<_> = self.connections.lock().drain().map(|(_, t)| t).collect();
        let count = tasks.len();
        for task in tasks {
            let _ = task.await;
        }

        info!(connections = count, "Server shut down");
    }
}

// ============================================================================
// Accept Loop
// ============================================================================

async fn accept_loop(
    listener: Listener,
    config: Arc<ConnectionConfig>,
    policy: Arc<OriginPolicy>,
    connections: ConnectionMap,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let id = ConnectionId::generate();
                    info!(connection = %id, %addr, "Connection accepted");

                    // Spawned under the lock so the task cannot remove itself first
                    connections.lock().insert(
                        id,
                        tokio::spawn(run_connection(
                            id,
                            stream,
                            Arc::clone(&config),
                            Arc::clone(&policy),
                            Arc::clone(&connections),
                            shutdown.clone(),
                        )),
                    );
                }
                Err(e) => warn!(error = %e, "Accept failed"),
            },

            _ = shutdown.changed() => {
                debug!("Accept loop stopping");
                break;
            }
        }
    }
}

async fn run_connection(
    id: ConnectionId,
    stream: TcpStream,
    config: Arc<ConnectionConfig>,
    policy: Arc<OriginPolicy>,
    connections: ConnectionMap,
    shutdown: watch::Receiver<bool>,
) {
    match transport::handshake(stream, &policy).await {
        Ok(ws) => transport::serve(id, ws, config, shutdown).await,
        Err(e) => warn!(connection = %id, error = %e, "Handshake failed"),
    }
    connections.lock().remove(&id);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;
    use std::time::Duration;

    use tokio_tungstenite::connect_async;

    use crate::browser::memory::MemoryLauncher;

    async fn listen(launcher: Arc<MemoryLauncher>) -> ServerHandle {
        Server::builder()
            .bind_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .port(0)
            .shared_launcher(launcher)
            .build()
            .expect("build")
            .listen()
            .await
            .expect("listen")
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met");
    }

    #[tokio::test]
    async fn test_listen_on_random_port() {
        let handle = listen(Arc::new(MemoryLauncher::new())).await;
        assert!(handle.local_addr().port() > 0);
        assert!(handle.ws_url().starts_with("ws://127.0.0.1:"));
        assert_eq!(handle.connection_count(), 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_one_browser_per_connection() {
        let launcher = Arc::new(MemoryLauncher::new());
        let handle = listen(Arc::clone(&launcher)).await;

        let (_a, _) = connect_async(handle.ws_url()).await.expect("connect a");
        let (_b, _) = connect_async(handle.ws_url()).await.expect("connect b");

        wait_for(|| launcher.launched().len() == 2).await;
        assert_eq!(handle.connection_count(), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_sessions() {
        let launcher = Arc::new(MemoryLauncher::new());
        let handle = listen(Arc::clone(&launcher)).await;

        let (_client, _) = connect_async(handle.ws_url()).await.expect("connect");
        wait_for(|| launcher.launched().len() == 1).await;

        handle.shutdown().await;
        assert!(launcher.launched()[0].is_closed());
    }

    #[tokio::test]
    async fn test_launch_options_passed_through() {
        let launcher = Arc::new(MemoryLauncher::new());
        let handle = Server::builder()
            .port(0)
            .launch_options(LaunchOptions::headless().with_arg("--mute-audio"))
            .shared_launcher(Arc::clone(&launcher) as Arc<dyn Launcher>)
            .build()
            .expect("build")
            .listen()
            .await
            .expect("listen");

        let (_client, _) = connect_async(handle.ws_url()).await.expect("connect");
        wait_for(|| launcher.last_options().is_some()).await;

        let options = launcher.last_options().expect("options");
        assert!(options.headless);
        assert_eq!(options.extra_args, vec!["--mute-audio".to_string()]);
        handle.shutdown().await;
    }
}
