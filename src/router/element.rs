//! Element commands.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::browser::JsHandle;
use crate::error::{Error, Result};
use crate::protocol::params::{
    self, ClickParams, SelectorParams, TypeParams, require, require_non_empty,
};
use crate::session::Session;

// ============================================================================
// Method Names
// ============================================================================

pub(super) const SELECT_ELEMENT: &str = "selectElement";
pub(super) const WAIT_FOR_SELECTOR: &str = "waitForSelector";
pub(super) const CLICK: &str = "click";
pub(super) const TYPE: &str = "type";

// ============================================================================
// Handlers
// ============================================================================

/// First element matching a selector, or `{}`.
pub(super) async fn select_element(
    session: &Session,
    params: &Map<String, Value>,
) -> Result<Value> {
    let p: SelectorParams = params::parse(SELECT_ELEMENT, params)?;
    let context = require(SELECT_ELEMENT, "context", p.context)?;
    let page = session.registry().page(&context)?;
    let selector = require_non_empty(SELECT_ELEMENT, "selector", p.selector)?;

    let found = page.query_selector(&selector).await?;
    element_result(session, found).await
}

/// Waits for a selector per visibility options, then behaves like `selectElement`.
pub(super) async fn wait_for_selector(
    session: &Session,
    params: &Map<String, Value>,
) -> Result<Value> {
    let p: SelectorParams = params::parse(WAIT_FOR_SELECTOR, params)?;
    let options = p.wait_options();
    let context = require(WAIT_FOR_SELECTOR, "context", p.context)?;
    let page = session.registry().page(&context)?;
    let selector = require_non_empty(WAIT_FOR_SELECTOR, "selector", p.selector)?;

    let found = page.wait_for_selector(&selector, &options).await?;
    element_result(session, found).await
}

/// Clicks a registered element.
pub(super) async fn click(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: ClickParams = params::parse(CLICK, params)?;
    let context = require(CLICK, "context", p.context)?;
    session.registry().page(&context)?;
    let object_id = require(CLICK, "objectId", p.object_id)?;

    let handle = session.registry().object(&object_id)?;
    let element = handle
        .as_element()
        .ok_or_else(|| Error::not_an_element(object_id.clone()))?;
    element.click().await?;
    Ok(json!({}))
}

/// Types into a registered element.
pub(super) async fn type_text(session: &Session, params: &Map<String, Value>) -> Result<Value> {
    let p: TypeParams = params::parse(TYPE, params)?;
    let context = require(TYPE, "context", p.context)?;
    session.registry().page(&context)?;
    let object_id = require(TYPE, "objectId", p.object_id)?;
    let text = require_non_empty(TYPE, "text", p.text)?;

    let handle = session.registry().object(&object_id)?;
    let element = handle
        .as_element()
        .ok_or_else(|| Error::not_an_element(object_id.clone()))?;
    element.type_text(&text, &p.options).await?;
    Ok(json!({}))
}

// ============================================================================
// Helpers
// ============================================================================

/// Registers a match and answers with its depth-0 value.
async fn element_result(session: &Session, found: Option<Arc<dyn JsHandle>>) -> Result<Value> {
    let Some(handle) = found else {
        return Ok(json!({}));
    };

    session.registry().register_object(Arc::clone(&handle))?;
    let value = session
        .serializer()
        .serialize_with_depth(handle.as_ref(), 0)
        .await?;
    Ok(serde_json::to_value(value)?)
}

// ============================================================================
// Tests
// ============================================================================
