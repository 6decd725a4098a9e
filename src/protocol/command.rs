//! Inbound command envelope and validation.
//!
//! # Format
//!
//! ```json
//! {
//!   "id": 1,
//!   "method": "navigate",
//!   "params": { "context": "...", "url": "https://example.com" }
//! }
//! ```
//!
//! Validation runs in order: JSON syntax, top-level object, `id`,
//! `method`, `params`. The first failure wins and becomes an
//! `invalid argument` error envelope.
//!
//! When a frame fails validation its top-level `id` is still recovered if
//! the payload is a JSON object that has one, so the client can correlate
//! the error. Payloads that are not valid JSON, or not objects, get a
//! `null` id.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::identifiers::CommandId;

// ============================================================================
// CommandEnvelope
// ============================================================================

/// A validated command from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    /// Client-assigned id, echoed in the response.
    pub id: CommandId,

    /// Method name, matched exactly by the router.
    pub method: String,

    /// Method parameters.
    pub params: Map<String, Value>,
}

// ============================================================================
// Rejected
// ============================================================================

/// A frame that failed envelope validation.
#[derive(Debug)]
pub struct Rejected {
    /// Top-level `id` recovered from the payload, if any.
    pub id: Option<Value>,

    /// Always [`Error::InvalidArgument`].
    pub error: Error,
}

impl Rejected {
    fn new(id: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            id,
            error: Error::invalid_argument(message),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

impl CommandEnvelope {
    /// Parses and validates a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] carrying the recovered id and an
    /// [`Error::InvalidArgument`] describing the first failed check.
    pub fn parse(text: &str) -> StdResult<Self, Rejected> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Rejected::new(None, format!("cannot parse message as JSON: {e}")))?;

        let Value::Object(mut object) = value else {
            return Err(Rejected::new(None, "message must be a JSON object"));
        };

        let recovered = object.get("id").cloned();

        let id = match object.get("id") {
            None => return Err(Rejected::new(None, "expected 'id' property")),
            Some(raw) => raw.as_u64().map(CommandId::new).ok_or_else(|| {
                Rejected::new(
                    recovered.clone(),
                    "expected 'id' to be a non-negative integer",
                )
            })?,
        };

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => {
                return Err(Rejected::new(recovered, "expected 'method' to be a string"));
            }
            None => return Err(Rejected::new(recovered, "expected 'method' property")),
        };

        let params = match object.remove("params") {
            Some(Value::Object(params)) => params,
            Some(_) => {
                return Err(Rejected::new(recovered, "expected 'params' to be an object"));
            }
            None => return Err(Rejected::new(recovered, "expected 'params' property")),
        };

        Ok(Self { id, method, params })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    fn rejected(text: &str) -> Rejected {
        CommandEnvelope::parse(text).expect_err("should be rejected")
    }

    #[test]
    fn test_valid_envelope() {
        let cmd = CommandEnvelope::parse(r#"{"id":1,"method":"session.status","params":{}}"#)
            .expect("valid");
        assert_eq!(cmd.id, CommandId::new(1));
        assert_eq!(cmd.method, "session.status");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let cmd = CommandEnvelope::parse(
            r#"{"id":3,"method":"navigate","params":{"url":"x"},"extra":true}"#,
        )
        .expect("valid");
        assert_eq!(cmd.params.get("url"), Some(&json!("x")));
    }

    #[test]
    fn test_invalid_json_has_null_id() {
        let r = rejected("this is not json");
        assert!(r.id.is_none());
        assert!(matches!(r.error, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_non_object_has_null_id() {
        let r = rejected("[1, 2, 3]");
        assert!(r.id.is_none());
        assert_eq!(r.error.to_string(), "message must be a JSON object");
    }

    #[test]
    fn test_empty_object() {
        let r = rejected("{}");
        assert!(r.id.is_none());
        assert_eq!(r.error.to_string(), "expected 'id' property");
    }

    #[test]
    fn test_negative_id_is_echoed() {
        let r = rejected(r#"{"id":-1,"method":"session.status","params":{}}"#);
        assert_eq!(r.id, Some(json!(-1)));
    }

    #[test]
    fn test_fractional_id_rejected() {
        let r = rejected(r#"{"id":1.5,"method":"session.status","params":{}}"#);
        assert_eq!(r.id, Some(json!(1.5)));
    }

    #[test]
    fn test_bad_method_keeps_id() {
        let r = rejected(r#"{"id":4,"method":5,"params":{}}"#);
        assert_eq!(r.id, Some(json!(4)));
        assert_eq!(r.error.to_string(), "expected 'method' to be a string");
    }

    #[test]
    fn test_missing_params_keeps_id() {
        let r = rejected(r#"{"id":9,"method":"session.status"}"#);
        assert_eq!(r.id, Some(json!(9)));
    }

    #[test]
    fn test_params_must_be_object() {
        let r = rejected(r#"{"id":2,"method":"navigate","params":[]}"#);
        assert_eq!(r.id, Some(json!(2)));
        assert_eq!(r.error.to_string(), "expected 'params' to be an object");
    }

    proptest! {
        #[test]
        fn test_recovers_any_top_level_id(id in any::<i64>(), method in any::<i32>()) {
            let text = json!({"id": id, "method": method, "params": {}}).to_string();
            let r = CommandEnvelope::parse(&text).expect_err("method is not a string");
            prop_assert_eq!(r.id, Some(json!(id)));
        }

        #[test]
        fn test_garbage_never_panics(text in ".*") {
            let _ = CommandEnvelope::parse(&text);
        }
    }
}
