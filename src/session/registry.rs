//! Per-session handle registry.
//!
//! Maps opaque context and object ids to live library handles. Each
//! browser-side identity is registered at most once; re-registration
//! returns the existing entry. Handles are kept until the session closes.
//!
//! After [`Registry::close`] every lookup fails with
//! [`Error::SessionClosed`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::browser::{JsHandle, Page};
use crate::error::{Error, Result};
use crate::identifiers::{ContextId, ObjectId};

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct Inner {
    pages: FxHashMap<ContextId, Arc<dyn Page>>,
    objects: FxHashMap<ObjectId, Arc<dyn JsHandle>>,
    closed: bool,
}

impl Inner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
}

/// Context and object handles of one session.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Registers `page` under its target id.
    ///
    /// Returns the id and `true` if the page was not registered before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after [`close`](Self::close).
    pub fn register_page(&self, page: Arc<dyn Page>) -> Result<(ContextId, bool)> {
        let id = page.target_info().id;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;

        if inner.pages.contains_key(&id) {
            return Ok((id, false));
        }
        inner.pages.insert(id.clone(), page);
        Ok((id, true))
    }

    /// Looks up a page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextNotFound`] if `id` is unknown.
    pub fn page(&self, id: &ContextId) -> Result<Arc<dyn Page>> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        inner
            .pages
            .get(id)
            .cloned()
            .ok_or_else(|| Error::context_not_found(id.clone()))
    }

    /// Unregisters a page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextNotFound`] if `id` is unknown.
    pub fn remove_page(&self, id: &ContextId) -> Result<Arc<dyn Page>> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner
            .pages
            .remove(id)
            .ok_or_else(|| Error::context_not_found(id.clone()))
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Registers `handle` under its object id.
    ///
    /// Returns `None` for primitives, which have no object id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after [`close`](Self::close).
    pub fn register_object(&self, handle: Arc<dyn JsHandle>) -> Result<Option<ObjectId>> {
        let Some(id) = handle.object_id().cloned() else {
            return Ok(None);
        };

        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.objects.entry(id.clone()).or_insert(handle);
        Ok(Some(id))
    }

    /// Looks up an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectNotFound`] if `id` is unknown.
    pub fn object(&self, id: &ObjectId) -> Result<Arc<dyn JsHandle>> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        inner
            .objects
            .get(id)
            .cloned()
            .ok_or_else(|| Error::object_not_found(id.clone()))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Number of registered pages.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.inner.lock().pages.len()
    }

    /// Number of registered objects.
    #[inline]
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Returns `true` after [`close`](Self::close).
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Drops every handle and rejects further lookups.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.pages.clear();
        inner.objects.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
