//! Builder pattern for server configuration.
//!
//! # Example
//!
//! ```ignore
//! use bidi_bridge::{LaunchOptions, OriginPolicy, Server};
//!
//! let server = Server::builder()
//!     .port(9222)
//!     .launch_options(LaunchOptions::headless())
//!     .origin_policy(OriginPolicy::allow_list(["http://localhost:3000"])?)
//!     .launcher(MyLauncher::default())
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use crate::browser::Launcher;
use crate::error::{Error, Result};
use crate::remote::{DEFAULT_DEPTH, MAX_DEPTH};
use crate::transport::OriginPolicy;

use super::core::{DEFAULT_PORT, Server, ServerOptions};
use super::options::LaunchOptions;

// ============================================================================
// ServerBuilder
// ============================================================================

/// Builder for a [`Server`].
///
/// Use [`Server::builder()`] to create one.
#[derive(Clone)]
pub struct ServerBuilder {
    bind_ip: IpAddr,
    port: u16,
    launch_options: LaunchOptions,
    serialization_depth: u32,
    origin_policy: OriginPolicy,
    launcher: Option<Arc<dyn Launcher>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            launch_options: LaunchOptions::default(),
            serialization_depth: DEFAULT_DEPTH,
            origin_policy: OriginPolicy::default(),
            launcher: None,
        }
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("bind_ip", &self.bind_ip)
            .field("port", &self.port)
            .field("launch_options", &self.launch_options)
            .field("serialization_depth", &self.serialization_depth)
            .field("origin_policy", &self.origin_policy)
            .field("has_launcher", &self.launcher.is_some())
            .finish()
    }
}

// ============================================================================
// ServerBuilder Implementation
// ============================================================================

impl ServerBuilder {
    /// Creates a builder with default settings and no launcher.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to listen on. Defaults to `127.0.0.1`.
    #[inline]
    #[must_use]
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the port. Defaults to 8080; 0 lets the OS choose.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the options every browser is launched with.
    #[inline]
    #[must_use]
    pub fn launch_options(mut self, options: LaunchOptions) -> Self {
        self.launch_options = options;
        self
    }

    /// Sets the default serialization depth. Defaults to 1.
    #[inline]
    #[must_use]
    pub fn serialization_depth(mut self, depth: u32) -> Self {
        self.serialization_depth = depth;
        self
    }

    /// Sets the handshake origin policy. Defaults to allowing all origins.
    #[inline]
    #[must_use]
    pub fn origin_policy(mut self, policy: OriginPolicy) -> Self {
        self.origin_policy = policy;
        self
    }

    /// Sets the browser launcher.
    #[inline]
    #[must_use]
    pub fn launcher(self, launcher: impl Launcher) -> Self {
        self.shared_launcher(Arc::new(launcher))
    }

    /// Sets a launcher that is shared with other owners.
    #[inline]
    #[must_use]
    pub fn shared_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Builds the server with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no launcher is set, the depth is out of
    /// range or the launch options are invalid.
    pub fn build(self) -> Result<Server> {
        let launcher = self.launcher.ok_or_else(|| {
            Error::config(
                "A browser launcher is required. Use .launcher() to set it.\n\
                 Example: Server::builder().launcher(MyLauncher::default())",
            )
        })?;

        if !(1..=MAX_DEPTH).contains(&self.serialization_depth) {
            return Err(Error::config(format!(
                "Serialization depth must be between 1 and {MAX_DEPTH}, got {}",
                self.serialization_depth
            )));
        }

        self.launch_options.validate().map_err(Error::config)?;

        Ok(Server::new(
            ServerOptions {
                bind_ip: self.bind_ip,
                port: self.port,
                launch_options: self.launch_options,
                serialization_depth: self.serialization_depth,
                origin_policy: self.origin_policy,
            },
            launcher,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
