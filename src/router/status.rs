//! `session.status`.

use serde_json::{Value, json};

use crate::error::Result;
use crate::session::Session;

pub(super) const STATUS: &str = "session.status";

/// Reports whether the session's browser is usable.
pub(super) fn status(session: &Session) -> Result<Value> {
    Ok(if session.browser().is_connected() {
        json!({ "ready": true, "message": "ready" })
    } else {
        json!({ "ready": false, "message": "browser disconnected" })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::router::tests::Fixture;

    #[tokio::test]
    async fn test_status_ready() {
        let fx = Fixture::new();
        assert_eq!(
            fx.call(1, "session.status", json!({})).await,
            json!({"id": 1, "result": {"ready": true, "message": "ready"}})
        );
    }

    #[tokio::test]
    async fn test_status_after_disconnect() {
        let fx = Fixture::new();
        fx.browser.disconnect();
        let v = fx.call(2, "session.status", json!({})).await;
        assert_eq!(v["result"]["ready"], false);
        assert_eq!(v["result"]["message"], "browser disconnected");
    }
}
