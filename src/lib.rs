//! BiDi Bridge - WebDriver BiDi-style WebSocket front end for a browser
//! control library.
//!
//! Clients speak a small JSON command/response/event protocol over a
//! WebSocket. Each connection gets its own browser, launched through a
//! pluggable [`Launcher`], and its own [`Session`] that maps protocol
//! identifiers to live pages and remote objects.
//!
//! # Architecture
//!
//! ```text
//! client ──► transport ──► protocol::CommandEnvelope ──► router::dispatch
//!   ▲            │                                            │
//!   │            ▼                                            ▼
//!   └──── single writer ◄── events (page / browser) ◄── Session + Registry
//!                                                            │
//!                                                            ▼
//!                                              browser::{Browser, Page, JsHandle}
//! ```
//!
//! Key design principles:
//!
//! - One browser and one session per connection, torn down on close
//! - Every inbound text frame yields exactly one response frame
//! - Commands run concurrently; a single task writes to the socket
//! - Browser values leave the bridge as [`RemoteValue`] trees
//!
//! # Quick Start
//!
//! ```ignore
//! use bidi_bridge::{LaunchOptions, OriginPolicy, Result, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let handle = Server::builder()
//!         .port(9222)
//!         .launch_options(LaunchOptions::headless())
//!         .origin_policy(OriginPolicy::allow_list(["http://localhost:3000"])?)
//!         .launcher(MyLauncher::default())
//!         .build()?
//!         .listen()
//!         .await?;
//!
//!     println!("connect to {}", handle.ws_url());
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Browser control library traits |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Page and browser event forwarding |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`remote`] | Remote value serialization |
//! | [`router`] | Command dispatch |
//! | [`server`] | Server configuration and lifecycle |
//! | [`session`] | Per-connection session and object registry |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Browser control library traits.
///
/// The bridge is generic over [`Launcher`], [`Browser`], [`Page`] and
/// [`JsHandle`].
pub mod browser;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Event forwarding from the browser to the client.
pub mod events;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire message types.
///
/// Command envelopes, responses, events and remote values.
pub mod protocol;

/// Remote value serialization.
pub mod remote;

/// Command routing.
pub mod router;

/// Server configuration and lifecycle.
///
/// Use [`Server::builder()`] to create a configured server.
pub mod server;

/// Per-connection session state.
pub mod session;

/// WebSocket transport layer.
///
/// Internal module handling the listener, handshake and connection loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser contract
pub use browser::{Browser, ElementHandle, JsHandle, Launcher, Page, Target};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, ConnectionId, ContextId, ObjectId};

// Protocol types
pub use protocol::{CommandEnvelope, ErrorCode, Event, RemoteValue, Response};

// Serialization
pub use remote::RemoteSerializer;

// Server types
pub use server::{DEFAULT_PORT, LaunchOptions, Server, ServerBuilder, ServerHandle, ServerOptions};

// Session types
pub use session::{Registry, Session};

// Transport types
pub use transport::OriginPolicy;
