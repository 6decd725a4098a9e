//! Per-connection session.
//!
//! A [`Session`] owns the browser launched for one client, the
//! [`Registry`] of handles handed out to that client, and the event
//! subscriptions feeding its outbound channel. Handlers receive the
//! session explicitly; nothing is shared between sessions.
//!
//! # Lifecycle
//!
//! | Step | Method |
//! |------|--------|
//! | Browser events subscribed | [`Session::start`] |
//! | Page registered and subscribed | [`Session::adopt_page`] |
//! | Page unregistered and unsubscribed | [`Session::release_page`] |
//! | Subscriptions cancelled, registry closed, browser closed | [`Session::close`] |

// ============================================================================
// Submodules
// ============================================================================

mod registry;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::browser::{Browser, Page};
use crate::error::Result;
use crate::events::{self, Subscription};
use crate::identifiers::{ConnectionId, ContextId};
use crate::protocol::Outbound;
use crate::remote::RemoteSerializer;

pub use registry::Registry;

// ============================================================================
// Session
// ============================================================================

/// State of one client connection.
pub struct Session {
    id: ConnectionId,
    browser: Arc<dyn Browser>,
    registry: Registry,
    serializer: RemoteSerializer,
    outbound: mpsc::Sender<Outbound>,
    browser_subscription: Mutex<Option<Subscription>>,
    page_subscriptions: Mutex<FxHashMap<ContextId, Subscription>>,
    closed: AtomicBool,
}

impl Session {
    /// Creates a session around a launched browser.
    #[must_use]
    pub fn new(
        id: ConnectionId,
        browser: Arc<dyn Browser>,
        serializer: RemoteSerializer,
        outbound: mpsc::Sender<Outbound>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            browser,
            registry: Registry::new(),
            serializer,
            outbound,
            browser_subscription: Mutex::new(None),
            page_subscriptions: Mutex::new(FxHashMap::default()),
            closed: AtomicBool::new(false),
        })
    }

    /// Subscribes to browser-level events.
    pub fn start(&self) {
        let subscription =
            events::forward_browser_events(self.browser.events(), self.outbound.clone());
        if let Some(old) = self.browser_subscription.lock().replace(subscription) {
            old.cancel();
        }
        info!(connection = %self.id, "Session started");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Connection id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The session's browser.
    #[inline]
    #[must_use]
    pub fn browser(&self) -> &Arc<dyn Browser> {
        &self.browser
    }

    /// Handle registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Value serializer.
    #[inline]
    #[must_use]
    pub fn serializer(&self) -> &RemoteSerializer {
        &self.serializer
    }

    /// Returns `true` after [`close`](Self::close) started.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Registers `page` and subscribes to its events the first time it is seen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`](crate::Error::SessionClosed) after close.
    pub fn adopt_page(&self, page: Arc<dyn Page>) -> Result<ContextId> {
        let events = page.events();
        let (context, new) = self.registry.register_page(page)?;

        if new {
            debug!(connection = %self.id, %context, "Page registered");
            let subscription = events::forward_page_events(
                context.clone(),
                events,
                self.serializer,
                self.outbound.clone(),
            );
            self.page_subscriptions
                .lock()
                .insert(context.clone(), subscription);
        }

        Ok(context)
    }

    /// Unregisters a page and stops forwarding its events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextNotFound`](crate::Error::ContextNotFound) if unknown.
    pub fn release_page(&self, context: &ContextId) -> Result<Arc<dyn Page>> {
        let page = self.registry.remove_page(context)?;
        if let Some(subscription) = self.page_subscriptions.lock().remove(context) {
            subscription.cancel();
        }
        debug!(connection = %self.id, %context, "Page released");
        Ok(page)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tears the session down. Idempotent.
    ///
    /// Stops all event forwarding, closes the registry and closes the
    /// browser if it is still connected.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(subscription) = self.browser_subscription.lock().take() {
            subscription.cancel();
        }
        for (_, subscription) in self.page_subscriptions.lock().drain() {
            subscription.cancel();
        }
        self.registry.close();

        if self.browser.is_connected()
            && let Err(e) = self.browser.close().await
        {
            warn!(connection = %self.id, error = %e, "Failed to close browser");
        }

        info!(connection = %self.id, "Session closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::browser::PageEvent;
    use crate::browser::memory::MemoryBrowser;
    use crate::error::Error;

    fn session(browser: &Arc<MemoryBrowser>) -> (Arc<Session>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(16);
        let session = Session::new(
            ConnectionId::generate(),
            Arc::clone(browser) as Arc<dyn Browser>,
            RemoteSerializer::default(),
            tx,
        );
        (session, rx)
    }

    #[tokio::test]
    async fn test_adopt_page_subscribes_once() {
        let browser = Arc::new(MemoryBrowser::new());
        let page = browser.open_page(None);
        let (session, mut rx) = session(&browser);

        let a = session.adopt_page(page.clone()).expect("adopt");
        let b = session.adopt_page(page.clone()).expect("adopt");
        assert_eq!(a, b);

        page.emit(PageEvent::Load);
        let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("frame")
            .expect("open");
        assert!(matches!(frame, Outbound::Event(e) if e.method == "DEBUG.Page.load"));

        // a second subscription would produce a duplicate
        assert!(
            tokio::time::timeout(Duration::from_millis(50), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_closes_browser() {
        let browser = Arc::new(MemoryBrowser::new());
        let page = browser.open_page(None);
        let (session, _rx) = session(&browser);
        session.start();
        let context = session.adopt_page(page).expect("adopt");

        session.close().await;
        session.close().await;

        assert!(session.is_closed());
        assert!(browser.is_closed());
        assert!(matches!(
            session.registry().page(&context),
            Err(Error::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_close_skips_disconnected_browser() {
        let browser = Arc::new(MemoryBrowser::new());
        let (session, _rx) = session(&browser);

        browser.disconnect();
        session.close().await;
        assert!(!browser.is_closed());
    }

    #[tokio::test]
    async fn test_release_page() {
        let browser = Arc::new(MemoryBrowser::new());
        let page = browser.open_page(None);
        let (session, _rx) = session(&browser);
        let context = session.adopt_page(page).expect("adopt");

        session.release_page(&context).expect("release");
        assert!(session.registry().page(&context).is_err());
    }
}
