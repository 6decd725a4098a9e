//! Event forwarding.
//!
//! Each subscription is a task draining one library event receiver into the
//! connection's outbound channel. Tasks end when the receiver closes, when
//! the outbound channel closes, or when their [`Subscription`] is cancelled
//! or dropped.
//!
//! # Browser Events
//!
//! | Library event | Outbound |
//! |---------------|----------|
//! | target created | `browsingContext.contextCreated` (forwarded kinds only) |
//! | target destroyed | `browsingContext.contextDestroyed` (forwarded kinds only) |
//! | disconnected | `{"id": null, "error": "unknown error", "message": "browser closed"}`, then close |
//!
//! # Page Events
//!
//! | Library event | Outbound |
//! |---------------|----------|
//! | load | `DEBUG.Page.load` |
//! | console message | `log.entryAdded` |

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::browser::{BrowserEvent, ConsoleMessage, PageEvent};
use crate::error::Error;
use crate::identifiers::ContextId;
use crate::protocol::{
    BrowsingContextInfo, Event, LogEntry, LogLevel, Outbound, RemoteValue, Response, StackTrace,
};
use crate::remote::RemoteSerializer;

// ============================================================================
// Subscription
// ============================================================================

/// Cancellation handle of a forwarding task.
///
/// Dropping it cancels the task.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops forwarding.
    pub fn cancel(&self) {
        self.task.abort();
    }

}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Browser Events
// ============================================================================

/// Forwards browser-level events.
pub fn forward_browser_events(
    mut events: mpsc::UnboundedReceiver<BrowserEvent>,
    outbound: mpsc::Sender<Outbound>,
) -> Subscription {
    let task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frames = match event {
                BrowserEvent::TargetCreated(info) if info.kind.is_forwarded() => {
                    vec![Outbound::Event(Event::context_created(
                        &BrowsingContextInfo::from(&info),
                    ))]
                }
                BrowserEvent::TargetDestroyed(info) if info.kind.is_forwarded() => {
                    vec![Outbound::Event(Event::context_destroyed(
                        &BrowsingContextInfo::from(&info),
                    ))]
                }
                BrowserEvent::TargetCreated(info) | BrowserEvent::TargetDestroyed(info) => {
                    trace!(target_id = %info.id, kind = ?info.kind, "Target event filtered");
                    continue;
                }
                BrowserEvent::Disconnected => {
                    warn!("Browser disconnected");
                    vec![
                        Outbound::Response(Response::unsolicited(&Error::BrowserDisconnected)),
                        Outbound::Close,
                    ]
                }
            };

            for frame in frames {
                if outbound.send(frame).await.is_err() {
                    debug!("Outbound channel closed, browser forwarder stopping");
                    return;
                }
            }
        }
        debug!("Browser event stream ended");
    });

    Subscription { task }
}

// ============================================================================
// Page Events
// ============================================================================

/// Forwards events of the page registered as `context`.
pub fn forward_page_events(
    context: ContextId,
    mut events: mpsc::UnboundedReceiver<PageEvent>,
    serializer: RemoteSerializer,
    outbound: mpsc::Sender<Outbound>,
) -> Subscription {
    let task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let event = match event {
                PageEvent::Load => Event::page_load(&context),
                PageEvent::Console(message) => {
                    Event::log_entry(&log_entry(&context, &message, &serializer).await)
                }
            };

            debug!(%context, method = %event.method, "Forwarding page event");
            if outbound.send(Outbound::Event(event)).await.is_err() {
                debug!(%context, "Outbound channel closed, page forwarder stopping");
                return;
            }
        }
        debug!(%context, "Page event stream ended");
    });

    Subscription { task }
}

/// Builds the `log.entryAdded` payload for a console call.
///
/// An argument that fails to serialize is reported as `unsupportedObject`.
async fn log_entry(
    context: &ContextId,
    message: &ConsoleMessage,
    serializer: &RemoteSerializer,
) -> LogEntry {
    let mut args = Vec::with_capacity(message.args.len());
    for arg in &message.args {
        let value = match serializer.serialize(arg.as_ref()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%context, error = %e, "Failed to serialize console argument");
                RemoteValue::UnsupportedObject {
                    object_id: arg.object_id().cloned(),
                }
            }
        };
        args.push(value);
    }

    let text = args
        .iter()
        .map(|a| a.to_display_text())
        .collect::<Vec<_>>()
        .join(" ");

    LogEntry {
        level: LogLevel::from_console_method(&message.kind),
        text,
        timestamp: now_millis(),
        stack_trace: StackTrace {
            call_frames: message.stack.clone(),
        },
        entry_type: "console",
        method: message.kind.clone(),
        context: context.clone(),
        args,
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::{Value, json};

    use crate::browser::memory::{MemoryBrowser, MemoryHandle};
    use crate::browser::{Browser, JsHandle, Page, StackFrame, TargetKind};

    async fn next_json(rx: &mut mpsc::Receiver<Outbound>) -> Option<Value> {
        let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for frame")?;
        frame
            .to_text()
            .expect("serialize")
            .map(|text| serde_json::from_str(&text).expect("json"))
    }

    #[tokio::test]
    async fn test_page_target_forwarded() {
        let browser = MemoryBrowser::new();
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_browser_events(browser.events(), tx);

        let page = browser.open_page(None);
        let frame = next_json(&mut rx).await.expect("frame");
        assert_eq!(frame["method"], "browsingContext.contextCreated");
        assert_eq!(frame["params"]["context"], page.id().as_str());
        assert_eq!(frame["params"]["parent"], Value::Null);
        assert_eq!(frame["params"]["url"], "about:blank");
    }

    #[tokio::test]
    async fn test_destroyed_page_forwarded_iframe_filtered() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let iframe = browser.add_target(TargetKind::Iframe, "https://ads.example/");
        let worker = browser.add_target(TargetKind::ServiceWorker, "https://example.com/sw.js");

        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_browser_events(browser.events(), tx);

        browser.remove_target(&iframe.id);
        browser.remove_target(&worker.id);
        page.close().await.expect("close");

        let frame = next_json(&mut rx).await.expect("frame");
        assert_eq!(
            frame,
            json!({
                "method": "browsingContext.contextDestroyed",
                "params": {"context": page.id().as_str(), "parent": null, "url": "about:blank"}
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_sends_error_then_close() {
        let browser = MemoryBrowser::new();
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_browser_events(browser.events(), tx);

        browser.disconnect();
        assert_eq!(
            next_json(&mut rx).await.expect("error frame"),
            json!({"id": null, "error": "unknown error", "message": "browser closed"})
        );
        assert!(matches!(rx.recv().await, Some(Outbound::Close)));
        assert!(!browser.is_connected());
    }

    #[tokio::test]
    async fn test_page_load() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_page_events(
            page.id().clone(),
            page.events(),
            RemoteSerializer::default(),
            tx,
        );

        page.emit(PageEvent::Load);
        assert_eq!(
            next_json(&mut rx).await.expect("frame"),
            json!({"method": "DEBUG.Page.load", "params": {"context": page.id().as_str()}})
        );
    }

    #[tokio::test]
    async fn test_console_message() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_page_events(
            page.id().clone(),
            page.events(),
            RemoteSerializer::default(),
            tx,
        );

        page.console(
            "warn",
            vec![
                MemoryHandle::string("count"),
                MemoryHandle::number(3),
                MemoryHandle::window(),
            ],
            vec![StackFrame {
                url: "https://example.com/app.js".into(),
                function_name: "main".into(),
                line_number: 10,
                column_number: 4,
            }],
        );

        let frame = next_json(&mut rx).await.expect("frame");
        let params = &frame["params"];
        assert_eq!(frame["method"], "log.entryAdded");
        assert_eq!(params["level"], "warning");
        assert_eq!(params["text"], "count 3 window");
        assert_eq!(params["type"], "console");
        assert_eq!(params["method"], "warn");
        assert_eq!(params["context"], page.id().as_str());
        assert_eq!(params["args"].as_array().map(Vec::len), Some(3));
        assert_eq!(
            params["stackTrace"]["callFrames"][0],
            json!({
                "url": "https://example.com/app.js",
                "functionName": "main",
                "lineNumber": 10,
                "columnNumber": 4
            })
        );
        assert!(params["timestamp"].as_u64().expect("timestamp") > 0);
    }

    #[tokio::test]
    async fn test_console_keeps_entry_when_argument_fails() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let (tx, mut rx) = mpsc::channel(16);
        let _sub = forward_page_events(
            page.id().clone(),
            page.events(),
            RemoteSerializer::default(),
            tx,
        );

        // Reports itself as a node but has no node data to fetch
        let broken = MemoryHandle::other_object(Some("node"), "HTMLElement");
        let id = broken.object_id().cloned().expect("id");
        page.console("log", vec![MemoryHandle::string("before"), broken], Vec::new());

        let frame = next_json(&mut rx).await.expect("frame");
        assert_eq!(frame["method"], "log.entryAdded");
        assert_eq!(frame["params"]["text"], "before unsupportedObject");
        assert_eq!(
            frame["params"]["args"][1],
            json!({"type": "unsupportedObject", "objectId": id.as_str()})
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_forwarding() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let (tx, mut rx) = mpsc::channel(16);
        let sub = forward_page_events(
            page.id().clone(),
            page.events(),
            RemoteSerializer::default(),
            tx,
        );

        sub.cancel();
        tokio::task::yield_now().await;
        page.emit(PageEvent::Load);

        assert!(
            tokio::time::timeout(Duration::from_millis(50), rx.recv())
                .await
                .map_or(true, |frame| frame.is_none())
        );
    }
}
