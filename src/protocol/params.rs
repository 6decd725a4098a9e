//! Typed command parameters.
//!
//! Each command's `params` object is deserialized into one of these
//! structs. Required fields are `Option` here and checked with
//! [`require`] / [`require_non_empty`] so a missing field produces a
//! message naming the field and the method.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::browser::{GotoOptions, LoadState, TypeOptions, WaitForSelectorOptions};
use crate::error::{Error, Result};
use crate::identifiers::{ContextId, ObjectId};

// ============================================================================
// Helpers
// ============================================================================

/// Deserializes `params` into `T`.
///
/// # Errors
///
/// Returns [`Error::InvalidParam`] if a field has the wrong type.
pub fn parse<T: DeserializeOwned>(method: &str, params: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| Error::invalid_param(method, e.to_string()))
}

/// Unwraps a required parameter.
///
/// # Errors
///
/// Returns [`Error::MissingParam`] if absent.
pub fn require<T>(method: &str, name: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| Error::missing_param(method, name))
}

/// Unwraps a required string parameter that must not be empty.
///
/// # Errors
///
/// Returns [`Error::MissingParam`] if absent or empty.
pub fn require_non_empty(method: &str, name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::missing_param(method, name)),
    }
}

// ============================================================================
// Browsing Context Params
// ============================================================================

/// `createContext`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContextParams {
    /// Navigate the new page here before answering.
    pub url: Option<String>,
}

/// Params carrying only a context: `Page.close`, `Page.screenshot`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextParams {
    /// Target context.
    pub context: Option<ContextId>,
}

/// `navigate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// Target context.
    pub context: Option<ContextId>,
    /// Destination URL.
    pub url: Option<String>,
    /// Load state(s) to wait for.
    pub wait_until: Option<WaitUntil>,
    /// Referer header.
    pub referer: Option<String>,
    /// Navigation timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl NavigateParams {
    /// Builds the library call options.
    #[must_use]
    pub fn goto_options(&self) -> GotoOptions {
        GotoOptions {
            wait_until: self
                .wait_until
                .clone()
                .map(WaitUntil::into_vec)
                .unwrap_or_default(),
            referer: self.referer.clone(),
            timeout_ms: self.timeout,
        }
    }
}

/// `waitUntil` as a single state or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WaitUntil {
    /// One state.
    One(LoadState),
    /// Several states, all awaited.
    Many(Vec<LoadState>),
}

impl WaitUntil {
    /// Flattens into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<LoadState> {
        match self {
            Self::One(state) => vec![state],
            Self::Many(states) => states,
        }
    }
}

// ============================================================================
// Element Params
// ============================================================================

/// `selectElement` and `waitForSelector`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorParams {
    /// Target context.
    pub context: Option<ContextId>,
    /// CSS selector.
    pub selector: Option<String>,
    /// Wait for the element to be visible.
    pub visible: Option<bool>,
    /// Wait for the element to be hidden or absent.
    pub hidden: Option<bool>,
    /// Wait timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl SelectorParams {
    /// Builds the library wait options.
    #[must_use]
    pub fn wait_options(&self) -> WaitForSelectorOptions {
        WaitForSelectorOptions {
            visible: self.visible.unwrap_or(false),
            hidden: self.hidden.unwrap_or(false),
            timeout_ms: self.timeout,
        }
    }
}

/// `click`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickParams {
    /// Target context.
    pub context: Option<ContextId>,
    /// Registered element.
    pub object_id: Option<ObjectId>,
}

/// `type`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeParams {
    /// Target context.
    pub context: Option<ContextId>,
    /// Registered element.
    pub object_id: Option<ObjectId>,
    /// Text to type.
    pub text: Option<String>,
    /// Typing options.
    #[serde(default)]
    pub options: TypeOptions,
}

// ============================================================================
// Script Params
// ============================================================================

/// `evaluate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluateParams {
    /// Target context.
    pub context: Option<ContextId>,
    /// Function source, e.g. `() => 1 + 1`.
    pub function: Option<String>,
    /// Call arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_navigate_params() {
        let p: NavigateParams = parse(
            "navigate",
            &params(json!({
                "context": "T1",
                "url": "https://example.com",
                "waitUntil": ["load", "networkidle0"],
                "timeout": 5000
            })),
        )
        .expect("parse");
        let options = p.goto_options();
        assert_eq!(
            options.wait_until,
            vec![LoadState::Load, LoadState::NetworkIdle0]
        );
        assert_eq!(options.timeout_ms, Some(5000));
    }

    #[test]
    fn test_wait_until_single() {
        let p: NavigateParams =
            parse("navigate", &params(json!({"waitUntil": "domcontentloaded"}))).expect("parse");
        assert_eq!(
            p.goto_options().wait_until,
            vec![LoadState::DomContentLoaded]
        );
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let err = parse::<NavigateParams>("navigate", &params(json!({"timeout": -1})))
            .expect_err("negative timeout");
        assert!(matches!(err, Error::InvalidParam { .. }));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("navigate", "url", Some(String::new())).is_err());
        assert!(require_non_empty("navigate", "url", None).is_err());
        assert_eq!(
            require_non_empty("navigate", "url", Some("x".into())).expect("present"),
            "x"
        );
    }

    #[test]
    fn test_missing_param_message() {
        let err = require::<ContextId>("click", "context", None).expect_err("missing");
        assert_eq!(
            err.to_string(),
            "missing required parameter 'context' for click"
        );
    }

    #[test]
    fn test_type_params_options() {
        let p: TypeParams = parse(
            "type",
            &params(json!({"context": "T1", "objectId": "o1", "text": "hi", "options": {"delay": 20}})),
        )
        .expect("parse");
        assert_eq!(p.options.delay_ms, Some(20));
        assert_eq!(p.object_id, Some(ObjectId::new("o1")));
    }
}
