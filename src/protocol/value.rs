//! Remote value wire representation.
//!
//! A [`RemoteValue`] is tagged by its `type` field. Primitives carry their
//! value inline; reference kinds carry an opaque `objectId` and, for
//! containers serialized with depth left, a nested `value`.
//!
//! ```json
//! { "type": "number", "value": 2 }
//! { "type": "number", "value": "+Infinity" }
//! { "type": "array", "objectId": "obj-3", "value": [{ "type": "string", "value": "a" }] }
//! { "type": "object", "objectId": "obj-4", "value": [["k", { "type": "boolean", "value": true }]] }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Number;

use crate::identifiers::ObjectId;

// ============================================================================
// RemoteValue
// ============================================================================

/// A browser-side value in wire form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RemoteValue {
    /// `undefined`.
    Undefined,

    /// `null`.
    Null,

    /// Boolean primitive.
    Boolean {
        /// The value.
        value: bool,
    },

    /// String primitive.
    String {
        /// The value.
        value: String,
    },

    /// Number primitive.
    Number {
        /// Finite number or textual special value.
        value: NumberValue,
    },

    /// BigInt primitive, as decimal text without suffix.
    Bigint {
        /// The value.
        value: String,
    },

    /// Symbol, with its description.
    Symbol {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// Description inside `Symbol(...)`.
        value: String,
    },

    /// Function.
    Function {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
    },

    /// Regular expression.
    Regexp {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// Source text, e.g. `/ab+c/gi`.
        value: String,
    },

    /// Date.
    Date {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// Canonical string form.
        value: String,
    },

    /// Error object.
    Error {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
    },

    /// DOM node.
    Node {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// Node properties, absent when out of depth.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Box<NodeValue>>,
    },

    /// Window proxy.
    Window {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
    },

    /// Array.
    Array {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// Elements in index order, absent when out of depth.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<RemoteValue>>,
    },

    /// Plain object.
    Object {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
        /// `[key, value]` pairs, absent when out of depth.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<(String, RemoteValue)>>,
    },

    /// Anything without a dedicated representation.
    UnsupportedObject {
        /// Remote object id.
        #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
        object_id: Option<ObjectId>,
    },
}

impl RemoteValue {
    /// Returns the wire `type` tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean { .. } => "boolean",
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::Bigint { .. } => "bigint",
            Self::Symbol { .. } => "symbol",
            Self::Function { .. } => "function",
            Self::Regexp { .. } => "regexp",
            Self::Date { .. } => "date",
            Self::Error { .. } => "error",
            Self::Node { .. } => "node",
            Self::Window { .. } => "window",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::UnsupportedObject { .. } => "unsupportedObject",
        }
    }

    /// Returns the object id of reference kinds.
    #[must_use]
    pub fn object_id(&self) -> Option<&ObjectId> {
        match self {
            Self::Symbol { object_id, .. }
            | Self::Function { object_id }
            | Self::Regexp { object_id, .. }
            | Self::Date { object_id, .. }
            | Self::Error { object_id }
            | Self::Node { object_id, .. }
            | Self::Window { object_id }
            | Self::Array { object_id, .. }
            | Self::Object { object_id, .. }
            | Self::UnsupportedObject { object_id } => object_id.as_ref(),
            Self::Undefined
            | Self::Null
            | Self::Boolean { .. }
            | Self::String { .. }
            | Self::Number { .. }
            | Self::Bigint { .. } => None,
        }
    }

    /// Renders the value the way a console would print it, roughly.
    ///
    /// Primitives print their value; reference kinds print their type.
    #[must_use]
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean { value } => value.to_string(),
            Self::String { value } => value.clone(),
            Self::Number { value } => value.to_string(),
            Self::Bigint { value } => value.clone(),
            Self::Symbol { value, .. } => format!("Symbol({value})"),
            Self::Regexp { value, .. } | Self::Date { value, .. } => value.clone(),
            other => other.type_name().to_string(),
        }
    }
}

// ============================================================================
// NumberValue
// ============================================================================

/// A number: finite values as JSON numbers, the rest as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumberValue {
    /// Finite number.
    Finite(Number),
    /// `NaN`, `-0`, `+Infinity` or `-Infinity`.
    Special(String),
}

impl std::fmt::Display for NumberValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(n) => write!(f, "{n}"),
            Self::Special(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// NodeValue
// ============================================================================

/// Properties of a serialized DOM node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeValue {
    /// DOM `nodeType`.
    pub node_type: u16,

    /// DOM `nodeValue`.
    pub node_value: Option<String>,

    /// Element local name.
    pub local_name: Option<String>,

    /// Namespace URI.
    #[serde(rename = "namespaceURI")]
    pub namespace_uri: Option<String>,

    /// Child count as reported by the metadata fetch.
    pub child_node_count: usize,

    /// Attributes by name.
    pub attributes: BTreeMap<String, String>,

    /// Serialized children.
    pub children: Vec<RemoteValue>,

    /// Serialized shadow root, if the element has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<Box<RemoteValue>>,
}

// ============================================================================
// Tests
// ============================================================================
