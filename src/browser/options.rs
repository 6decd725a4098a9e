//! Call options passed through to the browser control library.
//!
//! The bridge imposes no timeouts of its own; any timeout here is
//! interpreted by the library.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// LoadState
// ============================================================================

/// Navigation milestone to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// `load` event fired.
    Load,
    /// `DOMContentLoaded` fired.
    DomContentLoaded,
    /// No network connections for 500ms.
    NetworkIdle0,
    /// At most two network connections for 500ms.
    NetworkIdle2,
}

// ============================================================================
// GotoOptions
// ============================================================================

/// Options for [`Page::goto`](super::Page::goto).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GotoOptions {
    /// Milestones to wait for; empty means the library default.
    pub wait_until: Vec<LoadState>,
    /// Referer header.
    pub referer: Option<String>,
    /// Timeout in milliseconds; `Some(0)` disables it.
    pub timeout_ms: Option<u64>,
}

// ============================================================================
// WaitForSelectorOptions
// ============================================================================

/// Options for [`Page::wait_for_selector`](super::Page::wait_for_selector).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitForSelectorOptions {
    /// Wait until the element is visible.
    pub visible: bool,
    /// Wait until the element is hidden or detached.
    pub hidden: bool,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

// ============================================================================
// TypeOptions
// ============================================================================

/// Options for [`ElementHandle::type_text`](super::ElementHandle::type_text).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TypeOptions {
    /// Delay between key presses in milliseconds.
    #[serde(rename = "delay")]
    pub delay_ms: Option<u64>,
}
