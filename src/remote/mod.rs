//! Remote value serialization.
//!
//! Turns a [`JsHandle`] into a [`RemoteValue`] within a depth budget.
//!
//! # Depth
//!
//! | Depth | Containers | Nodes |
//! |-------|------------|-------|
//! | `0` | type and object id only | type and object id only |
//! | `n > 0` | entries serialized at `n - 1` | metadata, attributes, children and shadow root at `n - 1` |
//!
//! Every recursive call lowers the depth by one, so serialization always
//! terminates.
//!
//! # Round Trips
//!
//! Node serialization fetches metadata once, then each child and attribute
//! separately. The DOM can change between those fetches; the result then
//! mixes old counts with new entries.

// ============================================================================
// Submodules
// ============================================================================

mod kind;
mod node;

// ============================================================================
// Imports
// ============================================================================

use futures_util::future::BoxFuture;

use crate::browser::JsHandle;
use crate::error::Result;
use crate::protocol::RemoteValue;

pub use kind::HandleKind;

// ============================================================================
// Constants
// ============================================================================

/// Depth used when none is configured.
pub const DEFAULT_DEPTH: u32 = 1;

/// Largest depth a server may be configured with.
pub const MAX_DEPTH: u32 = 16;

// ============================================================================
// RemoteSerializer
// ============================================================================

/// Serializes handles with a configured default depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteSerializer {
    default_depth: u32,
}

impl Default for RemoteSerializer {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl RemoteSerializer {
    /// Creates a serializer.
    #[inline]
    #[must_use]
    pub const fn new(default_depth: u32) -> Self {
        Self { default_depth }
    }

    /// Returns the default depth.
    #[inline]
    #[must_use]
    pub const fn default_depth(&self) -> u32 {
        self.default_depth
    }

    /// Serializes `handle` at the default depth.
    ///
    /// # Errors
    ///
    /// Returns any error from a browser round trip.
    pub async fn serialize(&self, handle: &dyn JsHandle) -> Result<RemoteValue> {
        self.serialize_with_depth(handle, self.default_depth).await
    }

    /// Serializes `handle` at `depth`.
    ///
    /// # Errors
    ///
    /// Returns any error from a browser round trip.
    pub fn serialize_with_depth<'a>(
        &'a self,
        handle: &'a dyn JsHandle,
        depth: u32,
    ) -> BoxFuture<'a, Result<RemoteValue>> {
        Box::pin(async move {
            let object_id = handle.object_id().cloned();

            let value = match HandleKind::classify(handle.descriptor()) {
                HandleKind::Undefined => RemoteValue::Undefined,
                HandleKind::Null => RemoteValue::Null,
                HandleKind::Boolean(value) => RemoteValue::Boolean { value },
                HandleKind::String(value) => RemoteValue::String { value },
                HandleKind::Number(value) => RemoteValue::Number { value },
                HandleKind::Bigint(value) => RemoteValue::Bigint { value },
                HandleKind::Symbol(value) => RemoteValue::Symbol { object_id, value },
                HandleKind::Function => RemoteValue::Function { object_id },
                HandleKind::Regexp(value) => RemoteValue::Regexp { object_id, value },
                HandleKind::Date(value) => RemoteValue::Date { object_id, value },
                HandleKind::Error => RemoteValue::Error { object_id },
                HandleKind::Window => RemoteValue::Window { object_id },
                HandleKind::Unsupported => RemoteValue::UnsupportedObject { object_id },
                HandleKind::Node => {
                    let value = match depth {
                        0 => None,
                        _ => Some(Box::new(node::build(self, handle, depth).await?)),
                    };
                    RemoteValue::Node { object_id, value }
                }
                HandleKind::Array => {
                    let value = match depth {
                        0 => None,
                        _ => Some(self.array_items(handle, depth - 1).await?),
                    };
                    RemoteValue::Array { object_id, value }
                }
                HandleKind::Object => {
                    let value = match depth {
                        0 => None,
                        _ => Some(self.object_entries(handle, depth - 1).await?),
                    };
                    RemoteValue::Object { object_id, value }
                }
            };

            Ok(value)
        })
    }

    /// Own indexed properties in index order.
    async fn array_items(&self, handle: &dyn JsHandle, depth: u32) -> Result<Vec<RemoteValue>> {
        let mut indexed: Vec<_> = handle
            .properties()
            .await?
            .into_iter()
            .filter_map(|(key, item)| array_index(&key).map(|i| (i, item)))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);

        let mut items = Vec::with_capacity(indexed.len());
        for (_, item) in indexed {
            items.push(self.serialize_with_depth(item.as_ref(), depth).await?);
        }
        Ok(items)
    }

    /// Own enumerable properties as `[key, value]` pairs.
    async fn object_entries(
        &self,
        handle: &dyn JsHandle,
        depth: u32,
    ) -> Result<Vec<(String, RemoteValue)>> {
        let properties = handle.properties().await?;

        let mut entries = Vec::with_capacity(properties.len());
        for (key, item) in properties {
            let value = self.serialize_with_depth(item.as_ref(), depth).await?;
            entries.push((key, value));
        }
        Ok(entries)
    }
}

/// Parses `key` as a canonical array index: decimal, no sign or leading
/// zeros, below 2^32 - 1.
fn array_index(key: &str) -> Option<u32> {
    let index = key.parse::<u32>().ok().filter(|&i| i != u32::MAX)?;
    (index.to_string() == key).then_some(index)
}

// ============================================================================
// Tests
// ============================================================================
