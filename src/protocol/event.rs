//! Event message types.
//!
//! Events are unsolicited notifications sent to the client. They carry no
//! id and may arrive between any two responses.
//!
//! # Event Types
//!
//! | Method | Params |
//! |--------|--------|
//! | `browsingContext.contextCreated` | [`BrowsingContextInfo`] |
//! | `browsingContext.contextDestroyed` | [`BrowsingContextInfo`] |
//! | `log.entryAdded` | [`LogEntry`] |
//! | `DEBUG.Page.load` | `{ "context": ... }` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Value, json};

use crate::browser::{StackFrame, TargetInfo};
use crate::identifiers::ContextId;

use super::value::RemoteValue;

// ============================================================================
// Method Names
// ============================================================================

/// Page-type target appeared.
pub const CONTEXT_CREATED: &str = "browsingContext.contextCreated";

/// Page-type target went away.
pub const CONTEXT_DESTROYED: &str = "browsingContext.contextDestroyed";

/// Console output.
pub const LOG_ENTRY_ADDED: &str = "log.entryAdded";

/// Page finished loading.
pub const PAGE_LOAD: &str = "DEBUG.Page.load";

// ============================================================================
// Event
// ============================================================================

/// An outbound event envelope.
///
/// # Format
///
/// ```json
/// { "method": "module.eventName", "params": { ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Event name.
    pub method: String,

    /// Event payload.
    pub params: Value,
}

impl Event {
    /// Creates an event from any serializable payload.
    ///
    /// Payloads that fail to serialize become `{}`.
    #[must_use]
    pub fn new(method: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            method: method.into(),
            params: serde_json::to_value(params).unwrap_or_else(|_| json!({})),
        }
    }

    /// `browsingContext.contextCreated`.
    #[must_use]
    pub fn context_created(info: &BrowsingContextInfo) -> Self {
        Self::new(CONTEXT_CREATED, info)
    }

    /// `browsingContext.contextDestroyed`.
    #[must_use]
    pub fn context_destroyed(info: &BrowsingContextInfo) -> Self {
        Self::new(CONTEXT_DESTROYED, info)
    }

    /// `DEBUG.Page.load`.
    #[must_use]
    pub fn page_load(context: &ContextId) -> Self {
        Self::new(PAGE_LOAD, json!({ "context": context }))
    }

    /// `log.entryAdded`.
    #[must_use]
    pub fn log_entry(entry: &LogEntry) -> Self {
        Self::new(LOG_ENTRY_ADDED, entry)
    }
}

// ============================================================================
// BrowsingContextInfo
// ============================================================================

/// Description of one browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowsingContextInfo {
    /// Context id.
    pub context: ContextId,

    /// Opener context, `null` for top-level contexts.
    pub parent: Option<ContextId>,

    /// Current URL.
    pub url: String,
}

impl From<&TargetInfo> for BrowsingContextInfo {
    fn from(info: &TargetInfo) -> Self {
        Self {
            context: info.id.clone(),
            parent: info.opener.clone(),
            url: info.url.clone(),
        }
    }
}

// ============================================================================
// Log Entries
// ============================================================================

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// `debug`, `trace`.
    Debug,
    /// Everything unclassified.
    Info,
    /// `warn`, `warning`.
    Warning,
    /// `error`, `assert`.
    Error,
}

impl LogLevel {
    /// Classifies a console method name.
    #[must_use]
    pub fn from_console_method(method: &str) -> Self {
        match method {
            "error" | "assert" => Self::Error,
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// Stack trace attached to a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    /// Innermost frame first.
    pub call_frames: Vec<StackFrame>,
}

/// Payload of `log.entryAdded`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,

    /// Arguments rendered and joined with spaces.
    pub text: String,

    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,

    /// Where the console call happened.
    pub stack_trace: StackTrace,

    /// Always `console`.
    #[serde(rename = "type")]
    pub entry_type: &'static str,

    /// Console method, e.g. `log` or `warn`.
    pub method: String,

    /// Originating context.
    pub context: ContextId,

    /// Serialized arguments.
    pub args: Vec<RemoteValue>,
}

// ============================================================================
// Tests
// ============================================================================
