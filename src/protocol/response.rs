//! Response envelopes and error codes.
//!
//! # Format
//!
//! Success:
//! ```json
//! { "id": 1, "result": { ... } }
//! ```
//!
//! Error:
//! ```json
//! { "id": 1, "error": "unknown error", "message": "context not found: abc" }
//! ```
//!
//! The error `id` is `null` when it could not be recovered from the
//! inbound frame, and for unsolicited errors such as a browser disconnect.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::identifiers::CommandId;

use super::command::Rejected;

// ============================================================================
// ErrorCode
// ============================================================================

/// Wire error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// Envelope validation failed.
    #[serde(rename = "invalid argument")]
    InvalidArgument,
    /// No handler for the method.
    #[serde(rename = "unknown command")]
    UnknownCommand,
    /// Any handler or browser failure.
    #[serde(rename = "unknown error")]
    UnknownError,
}

impl ErrorCode {
    /// Returns the wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::UnknownCommand => "unknown command",
            Self::UnknownError => "unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Response
// ============================================================================

/// An outbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Handler succeeded.
    Success {
        /// Echoed command id.
        id: CommandId,
        /// Handler result object.
        result: Value,
    },

    /// Validation, routing or handler failure.
    Error {
        /// Echoed or recovered id; `null` if unknown.
        id: Option<Value>,
        /// Error code.
        error: ErrorCode,
        /// Human-readable message.
        message: String,
    },
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: CommandId, result: Value) -> Self {
        Self::Success { id, result }
    }

    /// Creates an error response for a known command id.
    #[must_use]
    pub fn error(id: CommandId, err: &Error) -> Self {
        Self::Error {
            id: Some(Value::from(id.as_u64())),
            error: err.code(),
            message: err.to_string(),
        }
    }

    /// Creates an error response with no id.
    #[must_use]
    pub fn unsolicited(err: &Error) -> Self {
        Self::Error {
            id: None,
            error: err.code(),
            message: err.to_string(),
        }
    }

    /// Creates the error response for a frame that failed validation.
    #[must_use]
    pub fn rejected(rejected: &Rejected) -> Self {
        Self::Error {
            id: rejected.id.clone(),
            error: rejected.error.code(),
            message: rejected.error.to_string(),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the error code, if this is an error response.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error, .. } => Some(*error),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::ContextId;
    use crate::protocol::CommandEnvelope;

    #[test]
    fn test_success_serialization() {
        let response = Response::success(
            CommandId::new(1),
            json!({"ready": true, "message": "ready"}),
        );
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json,
            json!({"id": 1, "result": {"ready": true, "message": "ready"}})
        );
    }

    #[test]
    fn test_error_serialization() {
        let err = Error::context_not_found(ContextId::new("nonexistent"));
        let response = Response::error(CommandId::new(2), &err);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json,
            json!({
                "id": 2,
                "error": "unknown error",
                "message": "context not found: nonexistent"
            })
        );
    }

    #[test]
    fn test_unsolicited_has_null_id() {
        let response = Response::unsolicited(&Error::BrowserDisconnected);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json,
            json!({"id": null, "error": "unknown error", "message": "browser closed"})
        );
    }

    #[test]
    fn test_rejected_frame() {
        let rejected = CommandEnvelope::parse("this is not json").expect_err("invalid");
        let response = Response::rejected(&rejected);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["id"], Value::Null);
        assert_eq!(json["error"], "invalid argument");
        assert!(json["message"].is_string());
    }

    #[test]
    fn test_unknown_command_code() {
        let response = Response::error(CommandId::new(5), &Error::unknown_command("bogus"));
        assert_eq!(response.error_code(), Some(ErrorCode::UnknownCommand));
        assert!(!response.is_success());
    }
}
