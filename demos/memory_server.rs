//! Bridge server over the scripted in-memory browser.
//!
//! Demonstrates:
//! - Building a server with launch options and an origin policy
//! - Logging setup with an env filter
//! - Graceful shutdown on Ctrl+C
//!
//! Every connection gets a fresh in-memory browser with one `about:blank`
//! page, so `session.status`, `browsingContext.getTree`, `createContext`,
//! `navigate` and `Page.screenshot` all answer without a real browser.
//!
//! Usage:
//!   cargo run --example memory_server --features test-util
//!   cargo run --example memory_server --features test-util -- --debug
//!   cargo run --example memory_server --features test-util -- --port 9222

// ============================================================================
// Imports
// ============================================================================

use anyhow::{Context, Result};
use bidi_bridge::browser::memory::MemoryLauncher;
use bidi_bridge::{DEFAULT_PORT, LaunchOptions, OriginPolicy, Server};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    port: u16,
    origins: Vec<String>,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();

        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        let port = match value_of("--port") {
            Some(port) => port.parse().context("--port must be a number")?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            debug: args.iter().any(|a| a == "--debug"),
            port,
            origins: value_of("--origin").into_iter().collect(),
        })
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "bidi_bridge=debug"
    } else {
        "bidi_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;
    init_logging(args.debug);

    let origin_policy = if args.origins.is_empty() {
        OriginPolicy::AllowAll
    } else {
        OriginPolicy::allow_list(&args.origins)?
    };

    let handle = Server::builder()
        .port(args.port)
        .launch_options(LaunchOptions::headless().with_window_size(1280, 720))
        .origin_policy(origin_policy)
        .launcher(MemoryLauncher::new())
        .build()?
        .listen()
        .await?;

    println!("Listening on {}", handle.ws_url());
    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    handle.shutdown().await;
    Ok(())
}
