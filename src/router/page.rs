//! `Page.close` and `Page.screenshot`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::protocol::params::{self, ContextParams, require};
use crate::session::Session;

pub(super) const CLOSE: &str = "Page.close";
pub(super) const SCREENSHOT: &str = "Page.screenshot";

/// Unregisters and closes a page.
pub(super) async fn close(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: ContextParams = params::parse(CLOSE, params)?;
    let context = require(CLOSE, "context", p.context)?;

    let page = session.release_page(&context)?;
    page.close().await?;
    Ok(json!({}))
}

/// Captures the viewport as base64 PNG.
pub(super) async fn screenshot(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: ContextParams = params::parse(SCREENSHOT, params)?;
    let context = require(SCREENSHOT, "context", p.context)?;
    let page = session.registry().page(&context)?;

    let bytes = page.screenshot().await?;
    Ok(json!({ "screenshot": Base64Standard.encode(bytes) }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::router::tests::Fixture;

    #[tokio::test]
    async fn test_screenshot() {
        let fx = Fixture::new();
        fx.page.set_screenshot(b"png".to_vec());
        assert_eq!(
            fx.call(1, "Page.screenshot", json!({"context": fx.context()}))
                .await,
            json!({"id": 1, "result": {"screenshot": "cG5n"}})
        );
    }

    #[tokio::test]
    async fn test_close_unregisters() {
        let fx = Fixture::new();
        let v = fx
            .call(1, "Page.close", json!({"context": fx.context()}))
            .await;
        assert_eq!(v, json!({"id": 1, "result": {}}));
        assert!(fx.page.is_closed());

        let v = fx
            .call(2, "Page.screenshot", json!({"context": fx.context()}))
            .await;
        assert_eq!(v["message"], format!("context not found: {}", fx.context()));
    }

    #[tokio::test]
    async fn test_close_requires_context() {
        let fx = Fixture::new();
        let v = fx.call(1, "Page.close", json!({})).await;
        assert_eq!(
            v,
            json!({"id": 1, "error": "unknown error", "message": "missing required parameter 'context' for Page.close"})
        );
    }
}
