//! Browsing context commands.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::browser::GotoOptions;
use crate::error::Result;
use crate::protocol::BrowsingContextInfo;
use crate::protocol::params::{
    self, CreateContextParams, NavigateParams, require, require_non_empty,
};
use crate::session::Session;

// ============================================================================
// Method Names
// ============================================================================

pub(super) const GET_TREE: &str = "browsingContext.getTree";
pub(super) const CREATE_CONTEXT: &str = "createContext";
pub(super) const NAVIGATE: &str = "navigate";

// ============================================================================
// Handlers
// ============================================================================

/// Lists every page, registering the ones not seen yet.
pub(super) async fn get_tree(session: &Session) -> Result<Value> {
    let mut contexts = Vec::new();

    for target in session.browser().targets().await? {
        let Some(page) = target.page().await? else {
            continue;
        };
        let info = page.target_info();
        session.adopt_page(page)?;
        contexts.push(BrowsingContextInfo::from(&info));
    }

    Ok(json!({ "contexts": contexts }))
}

/// Opens a page, optionally navigating it first.
pub(super) async fn create_context(
    session: &Session,
    params: &Map<String, Value>,
) -> Result<Value> {
    let p: CreateContextParams = params::parse(CREATE_CONTEXT, params)?;

    let page = session.browser().new_page().await?;
    let context = session.adopt_page(Arc::clone(&page))?;
    debug!(%context, "Context created");

    if let Some(url) = p.url.filter(|u| !u.is_empty()) {
        page.goto(&url, &GotoOptions::default()).await?;
    }

    Ok(serde_json::to_value(BrowsingContextInfo::from(
        &page.target_info(),
    ))?)
}

/// Navigates a registered page and waits per the given options.
pub(super) async fn navigate(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: NavigateParams = params::parse(NAVIGATE, params)?;
    let context = require(NAVIGATE, "context", p.context.clone())?;
    let page = session.registry().page(&context)?;
    let url = require_non_empty(NAVIGATE, "url", p.url.clone())?;

    page.goto(&url, &p.goto_options()).await?;
    Ok(json!({}))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::browser::{LoadState, TargetKind};
    use crate::router::tests::Fixture;

    #[tokio::test]
    async fn test_get_tree_registers_unseen_pages() {
        let fx = Fixture::new();
        let popup = fx.browser.open_page(Some(fx.page.id().clone()));
        fx.browser
            .add_target(TargetKind::ServiceWorker, "https://example.com/sw.js");
        assert_eq!(fx.session.registry().page_count(), 1);

        let v = fx.call(1, "browsingContext.getTree", json!({})).await;
        let contexts = v["result"]["contexts"].as_array().expect("contexts");
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[1]["context"], popup.id().as_str());
        assert_eq!(contexts[1]["parent"], fx.page.id().as_str());
        assert_eq!(fx.session.registry().page_count(), 2);

        // repeat walks do not duplicate
        fx.call(2, "browsingContext.getTree", json!({})).await;
        assert_eq!(fx.session.registry().page_count(), 2);
    }

    #[tokio::test]
    async fn test_create_context() {
        let fx = Fixture::new();
        let v = fx.call(1, "createContext", json!({})).await;
        let context = v["result"]["context"].as_str().expect("context").to_string();
        assert_eq!(v["result"]["url"], "about:blank");
        assert_eq!(v["result"]["parent"], serde_json::Value::Null);
        assert_eq!(fx.browser.pages().len(), 2);
        assert!(
            fx.session
                .registry()
                .page(&crate::identifiers::ContextId::new(context))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_create_context_with_url() {
        let fx = Fixture::new();
        let v = fx
            .call(1, "createContext", json!({"url": "https://example.com/"}))
            .await;
        assert_eq!(v["result"]["url"], "https://example.com/");
    }

    #[tokio::test]
    async fn test_navigate() {
        let fx = Fixture::new();
        let v = fx
            .call(
                3,
                "navigate",
                json!({
                    "context": fx.context(),
                    "url": "https://example.com/",
                    "waitUntil": "networkidle2",
                    "referer": "https://ref.example/"
                }),
            )
            .await;
        assert_eq!(v, json!({"id": 3, "result": {}}));
        assert_eq!(fx.page.url(), "https://example.com/");

        let options = fx.page.last_goto().expect("goto options");
        assert_eq!(options.wait_until, vec![LoadState::NetworkIdle2]);
        assert_eq!(options.referer.as_deref(), Some("https://ref.example/"));
    }

    #[tokio::test]
    async fn test_navigate_unknown_context() {
        let fx = Fixture::new();
        assert_eq!(
            fx.call(
                2,
                "navigate",
                json!({"context": "nonexistent", "url": "https://example.com"})
            )
            .await,
            json!({"id": 2, "error": "unknown error", "message": "context not found: nonexistent"})
        );
    }

    #[tokio::test]
    async fn test_navigate_requires_url() {
        let fx = Fixture::new();
        let v = fx
            .call(1, "navigate", json!({"context": fx.context(), "url": ""}))
            .await;
        assert_eq!(v["error"], "unknown error");
        assert_eq!(v["message"], "missing required parameter 'url' for navigate");
    }

    #[tokio::test]
    async fn test_navigate_failure_is_verbatim() {
        let fx = Fixture::new();
        fx.page
            .fail_navigation("https://nope.invalid/", "net::ERR_NAME_NOT_RESOLVED at https://nope.invalid/");
        let v = fx
            .call(
                1,
                "navigate",
                json!({"context": fx.context(), "url": "https://nope.invalid/"}),
            )
            .await;
        assert_eq!(
            v["message"],
            "net::ERR_NAME_NOT_RESOLVED at https://nope.invalid/"
        );
    }

    #[tokio::test]
    async fn test_navigate_negative_timeout() {
        let fx = Fixture::new();
        let v = fx
            .call(
                1,
                "navigate",
                json!({"context": fx.context(), "url": "https://example.com", "timeout": -5}),
            )
            .await;
        assert_eq!(v["error"], "unknown error");
    }
}
