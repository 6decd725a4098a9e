//! Bridge server module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Server`] | Configured server, ready to listen |
//! | [`ServerBuilder`] | Fluent configuration builder |
//! | [`ServerHandle`] | Listening server: address, connection count, shutdown |
//! | [`LaunchOptions`] | Browser launch options |
//!
//! # Example
//!
//! ```ignore
//! use bidi_bridge::{LaunchOptions, Server};
//!
//! let handle = Server::builder()
//!     .launch_options(LaunchOptions::headless())
//!     .launcher(MyLauncher::default())
//!     .build()?
//!     .listen()
//!     .await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for server configuration.
pub mod builder;

/// Server and running handle.
pub mod core;

/// Browser launch options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ServerBuilder;
pub use core::{DEFAULT_PORT, Server, ServerHandle, ServerOptions};
pub use options::LaunchOptions;
