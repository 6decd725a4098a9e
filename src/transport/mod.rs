//! WebSocket transport layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   WebSocket    ┌──────────────────────────────┐
//! │   Client    │◄──────────────►│  serve()                     │
//! │             │  JSON frames   │   ├─ router::dispatch tasks  │
//! └─────────────┘                │   ├─ event forwarders        │
//!                                │   └─ single writer           │
//!                                └──────────────┬───────────────┘
//!                                               │ Launcher / Browser
//!                                               ▼
//!                                        ┌─────────────┐
//!                                        │   Browser   │
//!                                        └─────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Listener::accept` - TCP connection accepted
//! 2. `handshake` - WebSocket upgrade with origin check
//! 3. `serve` - browser launched, session created, event loop runs
//! 4. Teardown - commands aborted, session closed, browser closed
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Per-connection event loop |
//! | `listener` | TCP listener and handshake |
//! | `origin` | Handshake origin policy |

// ============================================================================
// Submodules
// ============================================================================

/// Per-connection event loop.
pub mod connection;

/// TCP listener and WebSocket handshake.
pub mod listener;

/// Handshake origin policy.
pub mod origin;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ConnectionConfig, serve};
pub use listener::{Listener, handshake};
pub use origin::OriginPolicy;
