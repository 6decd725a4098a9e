//! TCP listener and WebSocket handshake.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::origin::OriginPolicy;

// ============================================================================
// Listener
// ============================================================================

/// A bound TCP listener for client connections.
pub struct Listener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Binds to `ip:port`. Port 0 lets the OS choose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "WebSocket listener bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

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

    /// Accepts the next TCP connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if accepting fails.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        Ok(self.listener.accept().await?)
    }
}

// ============================================================================
// Handshake
// ============================================================================

/// Upgrades `stream` to a WebSocket, enforcing `policy`.
///
/// Rejected origins get HTTP 403.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the upgrade fails or is rejected.
pub async fn handshake(
    stream: TcpStream,
    policy: &OriginPolicy,
) -> Result<WebSocketStream<TcpStream>> {
    let check_origin = |request: &Request, response: Response| {
        let origin = request
            .headers()
            .get(ORIGIN)
            .and_then(|value| value.to_str().ok());

        if policy.allows(origin) {
            return Ok(response);
        }

        warn!(origin = ?origin, "Handshake rejected by origin policy");
        let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
        *rejection.status_mut() = StatusCode::FORBIDDEN;
        Err(rejection)
    };

    tokio_tungstenite::accept_hdr_async(stream, check_origin)
        .await
        .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
