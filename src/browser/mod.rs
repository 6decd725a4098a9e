//! Browser control library contract.
//!
//! The bridge does not drive a browser itself. It talks to a browser
//! control library through the traits in this module:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`Launcher`] | Starts one browser per connection |
//! | [`Browser`] | Pages, targets, lifecycle, browser-level events |
//! | [`Target`] | Any browser target (page, worker, iframe, ...) |
//! | [`Page`] | Navigation, queries, evaluation, page-level events |
//! | [`JsHandle`] | A browser-side value and its introspection |
//! | [`ElementHandle`] | Input actions on a DOM element |
//!
//! Events are delivered through unbounded channels returned by
//! [`Browser::events`] and [`Page::events`]. A backend stops delivering by
//! dropping the sender; the bridge stops listening by dropping the receiver.
//!
//! With the `test-util` feature, [`memory`] provides a scripted in-memory
//! implementation.

// ============================================================================
// Submodules
// ============================================================================

/// Remote object handles.
pub mod handle;

/// Launcher, browser and target traits.
pub mod launcher;

/// Scripted in-memory backend.
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

/// Call options passed through to the library.
pub mod options;

/// Page trait and page events.
pub mod page;

// ============================================================================
// Re-exports
// ============================================================================

pub use handle::{ElementHandle, JsHandle, NodeMetadata, RemoteDescriptor};
pub use launcher::{Browser, BrowserEvent, Launcher, Target, TargetInfo, TargetKind};
pub use options::{GotoOptions, LoadState, TypeOptions, WaitForSelectorOptions};
pub use page::{ConsoleMessage, EvalArg, Page, PageEvent, StackFrame};
