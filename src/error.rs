//! Error types for the BiDi bridge.
//!
//! This module defines all error types used throughout the crate and
//! the mapping from errors to wire error codes.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bidi_bridge::{Error, Result};
//!
//! fn lookup(session: &Session, id: &ContextId) -> Result<Arc<dyn Page>> {
//!     session.registry().page(id)
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Wire code |
//! |----------|----------|-----------|
//! | Envelope | [`Error::InvalidArgument`] | `invalid argument` |
//! | Routing | [`Error::UnknownCommand`] | `unknown command` |
//! | Precondition | [`Error::MissingParam`], [`Error::InvalidParam`], [`Error::ContextNotFound`], [`Error::ObjectNotFound`], [`Error::NotAnElement`] | `unknown error` |
//! | Browser | [`Error::Browser`], [`Error::Launch`], [`Error::BrowserDisconnected`] | `unknown error` |
//! | Lifecycle | [`Error::SessionClosed`], [`Error::Connection`] | `unknown error` |
//! | Configuration | [`Error::Config`] | - |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] | `unknown error` |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{ContextId, ObjectId};
use crate::protocol::ErrorCode;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`ServerBuilder::build`](crate::ServerBuilder::build)
    /// when the server configuration is invalid.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Session was torn down; every registry lookup fails with this.
    #[error("session closed")]
    SessionClosed,

    // ========================================================================
    // Envelope Errors
    // ========================================================================
    /// Inbound frame failed structural validation.
    #[error("{message}")]
    InvalidArgument {
        /// Validation message.
        message: String,
    },

    /// Method name did not match any handler.
    #[error("unknown command: {method}")]
    UnknownCommand {
        /// The unrecognized method.
        method: String,
    },

    // ========================================================================
    // Handler Precondition Errors
    // ========================================================================
    /// Required parameter absent.
    #[error("missing required parameter '{name}' for {method}")]
    MissingParam {
        /// Command method.
        method: String,
        /// Parameter name.
        name: String,
    },

    /// Parameter present but unusable.
    #[error("invalid parameter for {method}: {message}")]
    InvalidParam {
        /// Command method.
        method: String,
        /// What was wrong.
        message: String,
    },

    /// Context id is not in the session registry.
    #[error("context not found: {context}")]
    ContextNotFound {
        /// The unresolved context id.
        context: ContextId,
    },

    /// Object id is not in the session registry.
    #[error("element not found: {object_id}")]
    ObjectNotFound {
        /// The unresolved object id.
        object_id: ObjectId,
    },

    /// Object resolved but is not a DOM element.
    #[error("object is not an element: {object_id}")]
    NotAnElement {
        /// The offending object id.
        object_id: ObjectId,
    },

    // ========================================================================
    // Browser Errors
    // ========================================================================
    /// Browser could not be launched.
    #[error("failed to launch browser: {message}")]
    Launch {
        /// Launcher message.
        message: String,
    },

    /// Failure reported by the browser control library, passed through verbatim.
    #[error("{message}")]
    Browser {
        /// Library message.
        message: String,
    },

    /// Browser process went away.
    #[error("browser closed")]
    BrowserDisconnected,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(method: impl Into<String>) -> Self {
        Self::UnknownCommand {
            method: method.into(),
        }
    }

    /// Creates a missing parameter error.
    #[inline]
    pub fn missing_param(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingParam {
            method: method.into(),
            name: name.into(),
        }
    }

    /// Creates an invalid parameter error.
    #[inline]
    pub fn invalid_param(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Creates a context not found error.
    #[inline]
    pub fn context_not_found(context: ContextId) -> Self {
        Self::ContextNotFound { context }
    }

    /// Creates an object not found error.
    #[inline]
    pub fn object_not_found(object_id: ObjectId) -> Self {
        Self::ObjectNotFound { object_id }
    }

    /// Creates a not-an-element error.
    #[inline]
    pub fn not_an_element(object_id: ObjectId) -> Self {
        Self::NotAnElement { object_id }
    }

    /// Creates a launch error.
    #[inline]
    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }

    /// Creates a browser control library error.
    #[inline]
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the wire error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::UnknownCommand { .. } => ErrorCode::UnknownCommand,
            _ => ErrorCode::UnknownError,
        }
    }

    /// Returns `true` if this error ends the session.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BrowserDisconnected | Self::SessionClosed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::context_not_found(ContextId::new("abc"));
        assert_eq!(err.to_string(), "context not found: abc");
    }

    #[test]
    fn test_browser_message_is_verbatim() {
        let err = Error::browser("net::ERR_NAME_NOT_RESOLVED at https://nope.invalid");
        assert_eq!(
            err.to_string(),
            "net::ERR_NAME_NOT_RESOLVED at https://nope.invalid"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            Error::invalid_argument("bad").code(),
            ErrorCode::InvalidArgument
        );
        assert_eq!(
            Error::unknown_command("nope").code(),
            ErrorCode::UnknownCommand
        );
        assert_eq!(
            Error::missing_param("navigate", "url").code(),
            ErrorCode::UnknownError
        );
        assert_eq!(
            Error::object_not_found(ObjectId::new("1")).code(),
            ErrorCode::UnknownError
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::BrowserDisconnected.is_fatal());
        assert!(Error::SessionClosed.is_fatal());
        assert!(!Error::browser("timeout").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::AddrInUse, "port taken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
