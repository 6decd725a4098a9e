//! Per-connection event loop.
//!
//! # Event Loop
//!
//! [`serve`] launches a browser, creates the [`Session`] and then selects
//! over:
//!
//! - inbound frames from the client
//! - the outbound channel (responses and events)
//! - completed command tasks
//! - server shutdown
//!
//! Every valid command runs as its own task, so a slow command never blocks
//! later ones; responses are correlated by id only. All frames except
//! envelope rejections pass through one bounded channel to the single
//! writer. Rejections are written by the loop itself, which owns the sink.
//!
//! # Teardown
//!
//! On client close, stream end, write failure, shutdown or browser
//! disconnect, in-flight commands are aborted and the session is closed.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

use crate::browser::Launcher;
use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::protocol::{CommandEnvelope, Outbound, Response};
use crate::remote::RemoteSerializer;
use crate::router;
use crate::server::LaunchOptions;
use crate::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Outbound frames buffered before producers wait.
const OUTBOUND_CAPACITY: usize = 256;

// ============================================================================
// Types
// ============================================================================

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

/// What every connection of a server shares.
pub struct ConnectionConfig {
    /// Launches one browser per connection.
    pub launcher: Arc<dyn Launcher>,
    /// Passed to every launch.
    pub launch_options: LaunchOptions,
    /// Serializer for results and console arguments.
    pub serializer: RemoteSerializer,
}

// ============================================================================
// Serve
// ============================================================================

/// Runs one client connection to completion.
pub async fn serve<S>(
    id: ConnectionId,
    ws: WebSocketStream<S>,
    config: Arc<ConnectionConfig>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();

    let browser = match config.launcher.launch(&config.launch_options).await {
        Ok(browser) => browser,
        Err(e) => {
            error!(connection = %id, error = %e, "Browser launch failed");
            let frame = Outbound::Response(Response::unsolicited(&e));
            if let Err(e) = write(&mut sink, &frame).await {
                debug!(connection = %id, error = %e, "Failed to report launch failure");
            }
            let _ = sink.close().await;
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let session = Session::new(id, browser, config.serializer, outbound_tx.clone());
    session.start();

    let mut commands = JoinSet::new();

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    trace!(connection = %id, len = text.len(), "Frame received");
                    match CommandEnvelope::parse(&text) {
                        Ok(command) => {
                            let session = Arc::clone(&session);
                            let responses = outbound_tx.clone();
                            commands.spawn(async move {
                                let response = router::dispatch(&session, command).await;
                                let _ = responses.send(Outbound::Response(response)).await;
                            });
                        }
                        Err(rejected) => {
                            debug!(connection = %id, error = %rejected.error, "Envelope rejected");
                            let frame = Outbound::Response(Response::rejected(&rejected));
                            if let Err(e) = write(&mut sink, &frame).await {
                                warn!(connection = %id, error = %e, "Failed to write frame");
                                break;
                            }
                        }
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!(connection = %id, len = data.len(), "Binary frame ignored");
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(connection = %id, "Client closed connection");
                    break;
                }
                // Ping, Pong, raw frames
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(connection = %id, error = %e, "WebSocket error");
                    break;
                }
            },

            frame = outbound_rx.recv() => match frame {
                Some(Outbound::Close) | None => {
                    debug!(connection = %id, "Closing connection");
                    let _ = sink.close().await;
                    break;
                }
                Some(frame) => {
                    if let Err(e) = write(&mut sink, &frame).await {
                        warn!(connection = %id, error = %e, "Failed to write frame");
                        break;
                    }
                }
            },

            Some(joined) = commands.join_next() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    error!(connection = %id, "Command task panicked");
                }
            }

            _ = shutdown.changed() => {
                debug!(connection = %id, "Server shutting down");
                let _ = sink.close().await;
                break;
            }
        }
    }

    commands.abort_all();
    session.close().await;
    info!(connection = %id, "Connection closed");
}

/// Writes one frame to the socket.
async fn write<S>(sink: &mut WsSink<S>, frame: &Outbound) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(text) = frame.to_text()? {
        sink.send(Message::Text(text.into())).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
