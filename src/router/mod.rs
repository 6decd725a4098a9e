//! Command routing.
//!
//! [`dispatch`] resolves a validated command to exactly one handler by exact
//! method name and turns its outcome into a [`Response`]. Handler failures
//! never escape: every error becomes an error envelope carrying the
//! command's id.
//!
//! # Methods
//!
//! | Method | Module |
//! |--------|--------|
//! | `session.status` | `status` |
//! | `browsingContext.getTree` | `context` |
//! | `createContext` | `context` |
//! | `navigate` | `context` |
//! | `selectElement` | `element` |
//! | `waitForSelector` | `element` |
//! | `click` | `element` |
//! | `type` | `element` |
//! | `evaluate` | `script` |
//! | `Page.close` | `page` |
//! | `Page.screenshot` | `page` |

// ============================================================================
// Submodules
// ============================================================================

mod context;
mod element;
mod page;
mod script;
mod status;

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{CommandEnvelope, Response};
use crate::session::Session;

// ============================================================================
// Method Names
// ============================================================================

/// Every routed method.
pub const METHODS: &[&str] = &[
    status::STATUS,
    context::GET_TREE,
    context::CREATE_CONTEXT,
    context::NAVIGATE,
    element::SELECT_ELEMENT,
    element::WAIT_FOR_SELECTOR,
    element::CLICK,
    element::TYPE,
    script::EVALUATE,
    page::CLOSE,
    page::SCREENSHOT,
];

// ============================================================================
// Dispatch
// ============================================================================

/// Runs `command` against `session`.
pub async fn dispatch(session: &Session, command: CommandEnvelope) -> Response {
    let CommandEnvelope { id, method, params } = command;

    debug!(connection = %session.id(), command_id = %id, %method, "Dispatching command");

    match route(session, &method, &params).await {
        Ok(result) => Response::success(id, result),
        Err(e) if e.is_fatal() => {
            warn!(
                connection = %session.id(),
                command_id = %id,
                %method,
                error = %e,
                "Command failed, session is gone"
            );
            Response::error(id, &e)
        }
        Err(e) => {
            debug!(
                connection = %session.id(),
                command_id = %id,
                %method,
                error = %e,
                "Command failed"
            );
            Response::error(id, &e)
        }
    }
}

async fn route(session: &Session, method: &str, params: &Map<String, Value>) -> Result<Value> {
    match method {
        status::STATUS => status::status(session),
        context::GET_TREE => context::get_tree(session).await,
        context::CREATE_CONTEXT => context::create_context(session, params).await,
        context::NAVIGATE => context::navigate(session, params).await,
        element::SELECT_ELEMENT => element::select_element(session, params).await,
        element::WAIT_FOR_SELECTOR => element::wait_for_selector(session, params).await,
        element::CLICK => element::click(session, params).await,
        element::TYPE => element::type_text(session, params).await,
        script::EVALUATE => script::evaluate(session, params).await,
        page::CLOSE => page::close(session, params).await,
        page::SCREENSHOT => page::screenshot(session, params).await,
        other => Err(Error::unknown_command(other)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::browser::Browser;
    use crate::browser::memory::{MemoryBrowser, MemoryPage};
    use crate::identifiers::{CommandId, ConnectionId};
    use crate::protocol::Outbound;
    use crate::remote::RemoteSerializer;

    /// A session over a fresh in-memory browser with one registered page.
    pub(crate) struct Fixture {
        pub browser: Arc<MemoryBrowser>,
        pub page: Arc<MemoryPage>,
        pub session: Arc<Session>,
        pub outbound: mpsc::Receiver<Outbound>,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let browser = Arc::new(MemoryBrowser::new());
            let page = browser.open_page(None);
            let (tx, outbound) = mpsc::channel(64);
            let session = Session::new(
                ConnectionId::generate(),
                Arc::clone(&browser) as Arc<dyn Browser>,
                RemoteSerializer::default(),
                tx,
            );
            session.adopt_page(page.clone()).expect("adopt");
            Self {
                browser,
                page,
                session,
                outbound,
            }
        }

        pub(crate) fn context(&self) -> String {
            self.page.id().to_string()
        }

        /// Sends one command and returns the response as JSON.
        pub(crate) async fn call(&self, id: u64, method: &str, params: Value) -> Value {
            let params = match params {
                Value::Object(map) => map,
                _ => panic!("params must be an object"),
            };
            let response = dispatch(
                &self.session,
                CommandEnvelope {
                    id: CommandId::new(id),
                    method: method.to_string(),
                    params,
                },
            )
            .await;
            serde_json::to_value(response).expect("serialize")
        }
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let fx = Fixture::new();
        assert_eq!(
            fx.call(4, "browsingContext.reload", json!({})).await,
            json!({"id": 4, "error": "unknown command", "message": "unknown command: browsingContext.reload"})
        );
    }

    #[tokio::test]
    async fn test_method_match_is_exact() {
        let fx = Fixture::new();
        let v = fx.call(1, "Session.Status", json!({})).await;
        assert_eq!(v["error"], "unknown command");
    }

    #[tokio::test]
    async fn test_every_method_is_routed() {
        let fx = Fixture::new();
        for (i, method) in METHODS.iter().enumerate() {
            let v = fx.call(i as u64, method, json!({})).await;
            assert_ne!(v["error"], "unknown command", "{method} not routed");
        }
    }

    #[tokio::test]
    async fn test_closed_session_answers_with_error() {
        let fx = Fixture::new();
        fx.session.close().await;

        let params = json!({"context": fx.context(), "url": "https://example.com"});
        assert_eq!(
            fx.call(5, "navigate", params).await,
            json!({"id": 5, "error": "unknown error", "message": "session closed"})
        );
    }
}
