//! Remote object handles.
//!
//! A [`JsHandle`] points at a value living in the browser. Its
//! [`RemoteDescriptor`] is what the library reported when the handle was
//! created (type, subtype, class name, inline value, description, object
//! id). The remaining methods are round trips into the browser.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::ObjectId;

use super::options::TypeOptions;

// ============================================================================
// RemoteDescriptor
// ============================================================================

/// What the library reports about a browser-side value.
///
/// Field names follow the DevTools `Runtime.RemoteObject` shape so a
/// backend can deserialize it directly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDescriptor {
    /// `undefined`, `boolean`, `string`, `number`, `bigint`, `symbol`,
    /// `function` or `object`.
    #[serde(rename = "type")]
    pub value_type: String,

    /// Object subtype: `null`, `regexp`, `date`, `error`, `node`, ...
    pub subtype: Option<String>,

    /// Constructor name: `Window`, `Array`, `Object`, ...
    pub class_name: Option<String>,

    /// Inline primitive value.
    pub value: Option<Value>,

    /// Text for values JSON cannot hold (`Infinity`, `-0`, `12n`).
    pub unserializable_value: Option<String>,

    /// Library-provided description string.
    pub description: Option<String>,

    /// Object id for reference values.
    pub object_id: Option<ObjectId>,
}

// ============================================================================
// NodeMetadata
// ============================================================================

/// DOM node facts fetched in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    /// DOM `nodeType`.
    pub node_type: u16,
    /// DOM `nodeValue`.
    pub node_value: Option<String>,
    /// Element local name.
    pub local_name: Option<String>,
    /// Namespace URI.
    pub namespace_uri: Option<String>,
    /// Number of child nodes at fetch time.
    pub child_node_count: usize,
    /// Number of attributes at fetch time.
    pub attribute_count: usize,
    /// Whether an open shadow root is attached.
    pub has_shadow_root: bool,
}

// ============================================================================
// JsHandle
// ============================================================================

/// Handle to a browser-side value.
#[async_trait]
pub trait JsHandle: Send + Sync {
    /// Returns the descriptor captured when the handle was created.
    fn descriptor(&self) -> &RemoteDescriptor;

    /// Returns the object id, if this is a reference value.
    fn object_id(&self) -> Option<&ObjectId> {
        self.descriptor().object_id.as_ref()
    }

    /// Own enumerable properties as key/handle pairs.
    async fn properties(&self) -> Result<Vec<(String, Arc<dyn JsHandle>)>>;

    /// Node metadata. Only meaningful for DOM nodes.
    async fn node_metadata(&self) -> Result<NodeMetadata>;

    /// Child node at `index`.
    async fn child_node(&self, index: usize) -> Result<Arc<dyn JsHandle>>;

    /// Attribute name and value at `index`.
    async fn attribute(&self, index: usize) -> Result<(String, String)>;

    /// Open shadow root, if any.
    async fn shadow_root(&self) -> Result<Option<Arc<dyn JsHandle>>>;

    /// Returns the element view of this handle, if it is a DOM element.
    fn as_element(&self) -> Option<&dyn ElementHandle> {
        None
    }
}

// ============================================================================
// ElementHandle
// ============================================================================

/// Input actions on a DOM element.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Scrolls into view and clicks the element's center.
    async fn click(&self) -> Result<()>;

    /// Focuses the element and types `text`.
    async fn type_text(&self, text: &str, options: &TypeOptions) -> Result<()>;
}
