//! Page trait and page events.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

use super::handle::JsHandle;
use super::launcher::TargetInfo;
use super::options::{GotoOptions, WaitForSelectorOptions};

// ============================================================================
// Page
// ============================================================================

/// A page (top-level browsing context).
#[async_trait]
pub trait Page: Send + Sync {
    /// Target identity and current URL.
    fn target_info(&self) -> TargetInfo;

    /// Navigates and waits per `options`.
    async fn goto(&self, url: &str, options: &GotoOptions) -> Result<()>;

    /// Captures the viewport as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// First element matching `selector`, if any.
    async fn query_selector(&self, selector: &str) -> Result<Option<Arc<dyn JsHandle>>>;

    /// Waits for `selector` per `options`.
    ///
    /// Resolves to `None` when waiting for `hidden` succeeds with no element.
    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &WaitForSelectorOptions,
    ) -> Result<Option<Arc<dyn JsHandle>>>;

    /// Calls the function whose source is `function` with `args`.
    async fn evaluate(&self, function: &str, args: Vec<EvalArg>) -> Result<Arc<dyn JsHandle>>;

    /// Closes the page.
    async fn close(&self) -> Result<()>;

    /// Subscribes to page-level events.
    fn events(&self) -> mpsc::UnboundedReceiver<PageEvent>;
}

// ============================================================================
// EvalArg
// ============================================================================

/// An argument to [`Page::evaluate`].
#[derive(Clone)]
pub enum EvalArg {
    /// A previously registered remote object.
    Handle(Arc<dyn JsHandle>),
    /// A JSON literal.
    Value(Value),
}

impl fmt::Debug for EvalArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle(handle) => f.debug_tuple("Handle").field(&handle.object_id()).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

// ============================================================================
// PageEvent
// ============================================================================

/// Page-level event.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The `load` event fired.
    Load,
    /// A console API was called.
    Console(ConsoleMessage),
}

/// A console API call.
#[derive(Clone)]
pub struct ConsoleMessage {
    /// Console method: `log`, `warn`, `error`, ...
    pub kind: String,
    /// Call arguments.
    pub args: Vec<Arc<dyn JsHandle>>,
    /// Call stack, innermost first.
    pub stack: Vec<StackFrame>,
}

impl fmt::Debug for ConsoleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleMessage")
            .field("kind", &self.kind)
            .field("arg_count", &self.args.len())
            .field("stack", &self.stack)
            .finish()
    }
}

/// One frame of a console call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Script URL.
    pub url: String,
    /// Function name, empty for top-level code.
    pub function_name: String,
    /// Zero-based line.
    pub line_number: u32,
    /// Zero-based column.
    pub column_number: u32,
}
