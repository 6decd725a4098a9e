//! Launcher, browser and target traits.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::identifiers::ContextId;
use crate::server::LaunchOptions;

use super::page::Page;

// ============================================================================
// Launcher
// ============================================================================

/// Starts browsers. One browser is launched per client connection.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// Launches a browser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`](crate::Error::Launch) (or any error the
    /// library reports) if the browser cannot be started.
    async fn launch(&self, options: &LaunchOptions) -> Result<Arc<dyn Browser>>;
}

// ============================================================================
// Browser
// ============================================================================

/// A running browser.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new page.
    async fn new_page(&self) -> Result<Arc<dyn Page>>;

    /// All current targets, including non-page ones.
    async fn targets(&self) -> Result<Vec<Arc<dyn Target>>>;

    /// Returns `false` once the browser process is gone.
    fn is_connected(&self) -> bool;

    /// Closes the browser and all its pages.
    async fn close(&self) -> Result<()>;

    /// Subscribes to browser-level events.
    fn events(&self) -> mpsc::UnboundedReceiver<BrowserEvent>;
}

/// Browser-level event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// A target appeared.
    TargetCreated(TargetInfo),
    /// A target went away.
    TargetDestroyed(TargetInfo),
    /// The browser process is gone.
    Disconnected,
}

// ============================================================================
// Target
// ============================================================================

/// Any browser target.
#[async_trait]
pub trait Target: Send + Sync {
    /// Snapshot of the target's identity and URL.
    fn info(&self) -> TargetInfo;

    /// The page behind a page-type target; `None` for other kinds.
    async fn page(&self) -> Result<Option<Arc<dyn Page>>>;
}

/// Identity and URL of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Browser-assigned target id, used as the context id.
    pub id: ContextId,
    /// Target kind.
    pub kind: TargetKind,
    /// Current URL.
    pub url: String,
    /// Target that opened this one.
    pub opener: Option<ContextId>,
}

/// Kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// The browser pseudo-target.
    Browser,
    /// Top-level page.
    Page,
    /// Extension background page.
    BackgroundPage,
    /// Out-of-process iframe.
    Iframe,
    /// Service worker.
    ServiceWorker,
    /// Shared worker.
    SharedWorker,
    /// Anything else.
    Other,
}

impl TargetKind {
    /// Returns `true` if lifecycle events for this kind reach clients.
    #[inline]
    #[must_use]
    pub const fn is_forwarded(&self) -> bool {
        !matches!(self, Self::Browser | Self::Iframe | Self::ServiceWorker)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_kinds() {
        assert!(TargetKind::Page.is_forwarded());
        assert!(TargetKind::BackgroundPage.is_forwarded());
        assert!(TargetKind::SharedWorker.is_forwarded());
        assert!(TargetKind::Other.is_forwarded());
        assert!(!TargetKind::Browser.is_forwarded());
        assert!(!TargetKind::Iframe.is_forwarded());
        assert!(!TargetKind::ServiceWorker.is_forwarded());
    }
}
