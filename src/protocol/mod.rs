//! Bridge protocol message types.
//!
//! This module defines the JSON frames exchanged with clients over the
//! WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Shape |
//! |--------------|-----------|-------|
//! | [`CommandEnvelope`] | Client → Bridge | `{"id", "method", "params"}` |
//! | [`Response`] | Bridge → Client | `{"id", "result"}` or `{"id", "error", "message"}` |
//! | [`Event`] | Bridge → Client | `{"method", "params"}` |
//!
//! Every inbound text frame produces exactly one [`Response`]. Events are
//! unsolicited and carry no id.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Inbound envelope and validation |
//! | `event` | Event envelopes and payloads |
//! | `params` | Typed command parameters |
//! | `response` | Success and error envelopes |
//! | `value` | Remote value wire representation |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound command envelope and validation.
pub mod command;

/// Event message types.
pub mod event;

/// Typed command parameters.
pub mod params;

/// Response envelopes and error codes.
pub mod response;

/// Remote value wire representation.
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{CommandEnvelope, Rejected};
pub use event::{BrowsingContextInfo, Event, LogEntry, LogLevel, StackTrace};
pub use response::{ErrorCode, Response};
pub use value::{NodeValue, NumberValue, RemoteValue};

// ============================================================================
// Outbound
// ============================================================================

/// A frame queued for the connection's single writer.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Command response (or unsolicited error envelope).
    Response(Response),
    /// Event notification.
    Event(Event),
    /// Close the connection after everything queued before it.
    Close,
}

impl Outbound {
    /// Serializes the frame to JSON text.
    ///
    /// Returns `None` for [`Outbound::Close`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_text(&self) -> crate::Result<Option<String>> {
        Ok(match self {
            Self::Response(response) => Some(serde_json::to_string(response)?),
            Self::Event(event) => Some(serde_json::to_string(event)?),
            Self::Close => None,
        })
    }
}
