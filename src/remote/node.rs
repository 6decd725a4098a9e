//! DOM node values.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::browser::JsHandle;
use crate::error::Result;
use crate::protocol::NodeValue;

use super::RemoteSerializer;

// ============================================================================
// Node Construction
// ============================================================================

/// Builds the node value of `handle`; `depth` must be positive.
///
/// Children and the shadow root are serialized at `depth - 1`.
pub(super) async fn build(
    serializer: &RemoteSerializer,
    handle: &dyn JsHandle,
    depth: u32,
) -> Result<NodeValue> {
    let child_depth = depth.saturating_sub(1);
    let metadata = handle.node_metadata().await?;

    let mut children = Vec::with_capacity(metadata.child_node_count);
    for index in 0..metadata.child_node_count {
        let child = handle.child_node(index).await?;
        children.push(
            serializer
                .serialize_with_depth(child.as_ref(), child_depth)
                .await?,
        );
    }

    let mut attributes = BTreeMap::new();
    for index in 0..metadata.attribute_count {
        let (name, value) = handle.attribute(index).await?;
        attributes.insert(name, value);
    }

    let root = if metadata.has_shadow_root {
        handle.shadow_root().await?
    } else {
        None
    };
    let shadow_root = match root {
        Some(root) => Some(Box::new(
            serializer
                .serialize_with_depth(root.as_ref(), child_depth)
                .await?,
        )),
        None => None,
    };

    Ok(NodeValue {
        node_type: metadata.node_type,
        node_value: metadata.node_value,
        local_name: metadata.local_name,
        namespace_uri: metadata.namespace_uri,
        child_node_count: metadata.child_node_count,
        attributes,
        children,
        shadow_root,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::browser::memory::MemoryHandle;
    use crate::protocol::RemoteValue;
    use crate::remote::RemoteSerializer;

    fn node_value(value: RemoteValue) -> crate::protocol::NodeValue {
        match value {
            RemoteValue::Node { value: Some(node), .. } => *node,
            other => panic!("expected node with value, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_element_with_children_and_attributes() {
        let el = MemoryHandle::element(
            "div",
            &[("id", "main"), ("class", "box")],
            vec![MemoryHandle::text("hello"), MemoryHandle::element("span", &[], vec![])],
        );

        let node = node_value(
            RemoteSerializer::default()
                .serialize_with_depth(&el, 1)
                .await
                .expect("serialize"),
        );

        assert_eq!(node.node_type, 1);
        assert_eq!(node.local_name.as_deref(), Some("div"));
        assert_eq!(node.child_node_count, 2);
        assert_eq!(node.attributes.get("id").map(String::as_str), Some("main"));
        assert_eq!(node.attributes.len(), 2);
        assert_eq!(node.children.len(), 2);

        // children are at depth 0
        for child in &node.children {
            assert!(matches!(child, RemoteValue::Node { value: None, .. }));
        }
    }

    #[tokio::test]
    async fn test_depth_zero_makes_no_round_trips() {
        let el = MemoryHandle::element("p", &[("a", "b")], vec![MemoryHandle::text("x")]);
        let value = RemoteSerializer::default()
            .serialize_with_depth(&el, 0)
            .await
            .expect("serialize");
        assert!(matches!(value, RemoteValue::Node { value: None, object_id: Some(_) }));
        assert_eq!(el.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_one_fetch_per_child_and_attribute() {
        let el = MemoryHandle::element(
            "ul",
            &[("role", "list")],
            vec![
                MemoryHandle::element("li", &[], vec![]),
                MemoryHandle::element("li", &[], vec![]),
                MemoryHandle::element("li", &[], vec![]),
            ],
        );
        RemoteSerializer::default()
            .serialize_with_depth(&el, 1)
            .await
            .expect("serialize");

        // metadata + 3 children + 1 attribute
        assert_eq!(el.round_trips(), 5);
    }

    #[tokio::test]
    async fn test_shadow_root() {
        let host = MemoryHandle::element("my-widget", &[], vec![])
            .with_shadow_root(MemoryHandle::shadow(vec![MemoryHandle::text("inside")]));

        let node = node_value(
            RemoteSerializer::new(2)
                .serialize(&host)
                .await
                .expect("serialize"),
        );
        let root = node_value(*node.shadow_root.expect("shadow root"));
        assert_eq!(root.node_type, 11);
        assert_eq!(root.children.len(), 1);
    }

    #[tokio::test]
    async fn test_text_node_value() {
        let json = serde_json::to_value(
            RemoteSerializer::default()
                .serialize(&MemoryHandle::text("hi"))
                .await
                .expect("serialize"),
        )
        .expect("to json");
        assert_eq!(json["value"]["nodeType"], 3);
        assert_eq!(json["value"]["nodeValue"], "hi");
        assert_eq!(json["value"]["namespaceURI"], serde_json::Value::Null);
    }
}
