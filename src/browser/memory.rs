//! Scripted in-memory backend.
//!
//! Implements the browser control contract without a browser. Pages hold
//! scripted evaluation results and selector matches; handles hold a fixed
//! value or DOM subtree. Tests and benches drive events through
//! [`MemoryBrowser::emit`] and [`MemoryPage::emit`].
//!
//! # Example
//!
//! ```ignore
//! let launcher = MemoryLauncher::new();
//! let browser = launcher.launch(&LaunchOptions::default()).await?;
//! let page = launcher.launched()[0].pages()[0].clone();
//! page.script("() => 1+1", MemoryHandle::number(2));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Number, Value};
use tokio::sync::{Notify, mpsc};

use crate::error::{Error, Result};
use crate::identifiers::{ContextId, ObjectId};
use crate::server::LaunchOptions;

use super::handle::{ElementHandle, JsHandle, NodeMetadata, RemoteDescriptor};
use super::launcher::{Browser, BrowserEvent, Launcher, Target, TargetInfo, TargetKind};
use super::options::{GotoOptions, TypeOptions, WaitForSelectorOptions};
use super::page::{ConsoleMessage, EvalArg, Page, PageEvent, StackFrame};

// ============================================================================
// Constants
// ============================================================================

/// XHTML namespace reported for elements.
const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Timeout reported when a wait fails without an explicit timeout.
const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Bytes returned by screenshots unless overridden.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

fn next_object_id() -> ObjectId {
    ObjectId::new(format!(
        "obj-{}",
        NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
    ))
}

fn next_target_id() -> ContextId {
    ContextId::new(format!(
        "target-{}",
        NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Sends to every live subscriber and forgets closed ones.
fn broadcast<T: Clone>(subscribers: &Mutex<Vec<mpsc::UnboundedSender<T>>>, event: T) {
    subscribers
        .lock()
        .retain(|tx| tx.send(event.clone()).is_ok());
}

// ============================================================================
// MemoryLauncher
// ============================================================================

/// Launches [`MemoryBrowser`]s, each with one `about:blank` page.
#[derive(Default)]
pub struct MemoryLauncher {
    launched: Mutex<Vec<Arc<MemoryBrowser>>>,
    failure: Option<String>,
    last_options: Mutex<Option<LaunchOptions>>,
}

impl MemoryLauncher {
    /// Creates a launcher that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a launcher that always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Browsers launched so far, oldest first.
    #[must_use]
    pub fn launched(&self) -> Vec<Arc<MemoryBrowser>> {
        self.launched.lock().clone()
    }

    /// Options passed to the most recent launch.
    #[must_use]
    pub fn last_options(&self) -> Option<LaunchOptions> {
        self.last_options.lock().clone()
    }
}

#[async_trait]
impl Launcher for MemoryLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Arc<dyn Browser>> {
        *self.last_options.lock() = Some(options.clone());

        if let Some(message) = &self.failure {
            return Err(Error::launch(message.clone()));
        }

        let browser = Arc::new(MemoryBrowser::new());
        browser.open_page(None);
        self.launched.lock().push(Arc::clone(&browser));
        Ok(browser)
    }
}

// ============================================================================
// MemoryBrowser
// ============================================================================

struct BrowserShared {
    id: ContextId,
    pages: Mutex<Vec<Arc<MemoryPage>>>,
    other_targets: Mutex<Vec<TargetInfo>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<BrowserEvent>>>,
    connected: AtomicBool,
    closed: AtomicBool,
}

/// An in-memory browser.
pub struct MemoryBrowser {
    shared: Arc<BrowserShared>,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBrowser {
    /// Creates a connected browser with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BrowserShared {
                id: next_target_id(),
                pages: Mutex::new(Vec::new()),
                other_targets: Mutex::new(Vec::new()),
                subscribers: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Opens a page as if the browser did it on its own (e.g. a popup).
    ///
    /// Emits [`BrowserEvent::TargetCreated`].
    pub fn open_page(&self, opener: Option<ContextId>) -> Arc<MemoryPage> {
        let page = Arc::new(MemoryPage::new(opener, Arc::downgrade(&self.shared)));
        self.shared.pages.lock().push(Arc::clone(&page));
        broadcast(
            &self.shared.subscribers,
            BrowserEvent::TargetCreated(page.target_info()),
        );
        page
    }

    /// Open pages, oldest first.
    #[must_use]
    pub fn pages(&self) -> Vec<Arc<MemoryPage>> {
        self.shared.pages.lock().clone()
    }

    /// Looks up an open page.
    #[must_use]
    pub fn page(&self, id: &ContextId) -> Option<Arc<MemoryPage>> {
        self.shared
            .pages
            .lock()
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    /// Adds a non-page target and emits [`BrowserEvent::TargetCreated`].
    pub fn add_target(&self, kind: TargetKind, url: impl Into<String>) -> TargetInfo {
        let info = TargetInfo {
            id: next_target_id(),
            kind,
            url: url.into(),
            opener: None,
        };
        self.shared.other_targets.lock().push(info.clone());
        broadcast(
            &self.shared.subscribers,
            BrowserEvent::TargetCreated(info.clone()),
        );
        info
    }

    /// Removes a non-page target and emits [`BrowserEvent::TargetDestroyed`].
    pub fn remove_target(&self, id: &ContextId) {
        let removed = {
            let mut targets = self.shared.other_targets.lock();
            let pos = targets.iter().position(|t| &t.id == id);
            pos.map(|i| targets.remove(i))
        };
        if let Some(info) = removed {
            broadcast(&self.shared.subscribers, BrowserEvent::TargetDestroyed(info));
        }
    }

    /// Emits an arbitrary browser event.
    pub fn emit(&self, event: BrowserEvent) {
        broadcast(&self.shared.subscribers, event);
    }

    /// Simulates the browser process dying.
    pub fn disconnect(&self) {
        self.shared.connected.store(false, Ordering::SeqCst);
        broadcast(&self.shared.subscribers, BrowserEvent::Disconnected);
    }

    /// Returns `true` once [`Browser::close`] ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Number of live browser event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.shared.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

#[async_trait]
impl Browser for MemoryBrowser {
    async fn new_page(&self) -> Result<Arc<dyn Page>> {
        if !self.is_connected() {
            return Err(Error::BrowserDisconnected);
        }
        Ok(self.open_page(None))
    }

    async fn targets(&self) -> Result<Vec<Arc<dyn Target>>> {
        let mut targets: Vec<Arc<dyn Target>> = vec![Arc::new(MemoryTarget {
            info: TargetInfo {
                id: self.shared.id.clone(),
                kind: TargetKind::Browser,
                url: String::new(),
                opener: None,
            },
            page: None,
        })];

        for page in self.pages() {
            targets.push(Arc::new(MemoryTarget {
                info: page.target_info(),
                page: Some(page),
            }));
        }

        for info in self.shared.other_targets.lock().iter() {
            targets.push(Arc::new(MemoryTarget {
                info: info.clone(),
                page: None,
            }));
        }

        Ok(targets)
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.subscribers.lock().clear();
        let pages: Vec<_> = self.shared.pages.lock().drain(..).collect();
        for page in pages {
            page.mark_closed();
        }
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<BrowserEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }
}

// ============================================================================
// MemoryTarget
// ============================================================================

struct MemoryTarget {
    info: TargetInfo,
    page: Option<Arc<MemoryPage>>,
}

#[async_trait]
impl Target for MemoryTarget {
    fn info(&self) -> TargetInfo {
        self.info.clone()
    }

    async fn page(&self) -> Result<Option<Arc<dyn Page>>> {
        Ok(self.page.clone().map(|p| p as Arc<dyn Page>))
    }
}

// ============================================================================
// MemoryPage
// ============================================================================

/// An in-memory page.
pub struct MemoryPage {
    id: ContextId,
    opener: Option<ContextId>,
    url: Mutex<String>,
    browser: Weak<BrowserShared>,
    scripts: Mutex<FxHashMap<String, Arc<MemoryHandle>>>,
    selectors: Mutex<FxHashMap<String, Arc<MemoryHandle>>>,
    navigation_failures: Mutex<FxHashMap<String, String>>,
    screenshot: Mutex<Vec<u8>>,
    last_goto: Mutex<Option<GotoOptions>>,
    last_args: Mutex<Vec<EvalArg>>,
    navigation_gate: Mutex<Option<Arc<Notify>>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PageEvent>>>,
    closed: AtomicBool,
}

impl MemoryPage {
    fn new(opener: Option<ContextId>, browser: Weak<BrowserShared>) -> Self {
        Self {
            id: next_target_id(),
            opener,
            url: Mutex::new("about:blank".to_string()),
            browser,
            scripts: Mutex::new(FxHashMap::default()),
            selectors: Mutex::new(FxHashMap::default()),
            navigation_failures: Mutex::new(FxHashMap::default()),
            screenshot: Mutex::new(PNG_SIGNATURE.to_vec()),
            last_goto: Mutex::new(None),
            last_args: Mutex::new(Vec::new()),
            navigation_gate: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// The page's context id.
    #[must_use]
    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// Current URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.url.lock().clone()
    }

    /// Makes `evaluate(function, ..)` resolve to `result`.
    pub fn script(&self, function: impl Into<String>, result: MemoryHandle) -> Arc<MemoryHandle> {
        let handle = Arc::new(result);
        self.scripts
            .lock()
            .insert(function.into(), Arc::clone(&handle));
        handle
    }

    /// Makes `selector` match `element`.
    pub fn add_selector(
        &self,
        selector: impl Into<String>,
        element: MemoryHandle,
    ) -> Arc<MemoryHandle> {
        let handle = Arc::new(element);
        self.selectors
            .lock()
            .insert(selector.into(), Arc::clone(&handle));
        handle
    }

    /// Makes navigation to `url` fail with `message`.
    pub fn fail_navigation(&self, url: impl Into<String>, message: impl Into<String>) {
        self.navigation_failures
            .lock()
            .insert(url.into(), message.into());
    }

    /// Holds every later `goto` until the returned gate is notified.
    ///
    /// Each `notify_one` releases one navigation.
    pub fn hold_navigation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.navigation_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Replaces the screenshot bytes.
    pub fn set_screenshot(&self, bytes: Vec<u8>) {
        *self.screenshot.lock() = bytes;
    }

    /// Options of the most recent successful `goto`.
    #[must_use]
    pub fn last_goto(&self) -> Option<GotoOptions> {
        self.last_goto.lock().clone()
    }

    /// Arguments of the most recent `evaluate`.
    #[must_use]
    pub fn last_args(&self) -> Vec<EvalArg> {
        self.last_args.lock().clone()
    }

    /// Emits a page event.
    pub fn emit(&self, event: PageEvent) {
        broadcast(&self.subscribers, event);
    }

    /// Emits a console message.
    pub fn console(&self, kind: &str, args: Vec<MemoryHandle>, stack: Vec<StackFrame>) {
        self.emit(PageEvent::Console(ConsoleMessage {
            kind: kind.to_string(),
            args: args
                .into_iter()
                .map(|a| Arc::new(a) as Arc<dyn JsHandle>)
                .collect(),
            stack,
        }));
    }

    /// Returns `true` once closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::browser("Protocol error: Target closed."));
        }
        Ok(())
    }
}

#[async_trait]
impl Page for MemoryPage {
    fn target_info(&self) -> TargetInfo {
        TargetInfo {
            id: self.id.clone(),
            kind: TargetKind::Page,
            url: self.url(),
            opener: self.opener.clone(),
        }
    }

    async fn goto(&self, url: &str, options: &GotoOptions) -> Result<()> {
        self.ensure_open()?;

        let gate = self.navigation_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
            self.ensure_open()?;
        }

        if let Some(message) = self.navigation_failures.lock().get(url) {
            return Err(Error::browser(message.clone()));
        }

        *self.url.lock() = url.to_string();
        *self.last_goto.lock() = Some(options.clone());
        self.emit(PageEvent::Load);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        Ok(self.screenshot.lock().clone())
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<Arc<dyn JsHandle>>> {
        self.ensure_open()?;
        Ok(self
            .selectors
            .lock()
            .get(selector)
            .cloned()
            .map(|h| h as Arc<dyn JsHandle>))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &WaitForSelectorOptions,
    ) -> Result<Option<Arc<dyn JsHandle>>> {
        self.ensure_open()?;
        let found = self.selectors.lock().get(selector).cloned();

        match found {
            Some(handle) if !options.hidden => Ok(Some(handle as Arc<dyn JsHandle>)),
            None if options.hidden => Ok(None),
            _ => Err(Error::browser(format!(
                "Waiting for selector `{selector}` failed: Waiting failed: {}ms exceeded",
                options.timeout_ms.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS)
            ))),
        }
    }

    async fn evaluate(&self, function: &str, args: Vec<EvalArg>) -> Result<Arc<dyn JsHandle>> {
        self.ensure_open()?;
        *self.last_args.lock() = args;

        self.scripts
            .lock()
            .get(function)
            .cloned()
            .map(|h| h as Arc<dyn JsHandle>)
            .ok_or_else(|| {
                Error::browser(format!(
                    "Evaluation failed: SyntaxError: no scripted result for {function}"
                ))
            })
    }

    async fn close(&self) -> Result<()> {
        self.ensure_open()?;
        self.mark_closed();

        if let Some(browser) = self.browser.upgrade() {
            browser.pages.lock().retain(|p| p.id != self.id);
            broadcast(
                &browser.subscribers,
                BrowserEvent::TargetDestroyed(self.target_info()),
            );
        }
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<PageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }
}

// ============================================================================
// MemoryHandle
// ============================================================================

/// Something done to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementAction {
    /// `click()`.
    Click,
    /// `type_text()`.
    Type {
        /// Typed text.
        text: String,
        /// Requested key delay.
        delay_ms: Option<u64>,
    },
}

struct MemoryNode {
    node_type: u16,
    node_value: Option<String>,
    local_name: Option<String>,
    namespace_uri: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Arc<MemoryHandle>>,
    shadow_root: Option<Arc<MemoryHandle>>,
}

/// An in-memory remote value.
pub struct MemoryHandle {
    descriptor: RemoteDescriptor,
    properties: Vec<(String, Arc<MemoryHandle>)>,
    node: Option<MemoryNode>,
    element: bool,
    detached: AtomicBool,
    actions: Mutex<Vec<ElementAction>>,
    round_trips: AtomicUsize,
}

impl MemoryHandle {
    /// Wraps an arbitrary descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: RemoteDescriptor) -> Self {
        Self {
            descriptor,
            properties: Vec::new(),
            node: None,
            element: false,
            detached: AtomicBool::new(false),
            actions: Mutex::new(Vec::new()),
            round_trips: AtomicUsize::new(0),
        }
    }

    fn primitive(value_type: &str, value: Option<Value>) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: value_type.to_string(),
            value,
            ..RemoteDescriptor::default()
        })
    }

    fn object(subtype: Option<&str>, class_name: &str, description: Option<&str>) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "object".to_string(),
            subtype: subtype.map(str::to_string),
            class_name: Some(class_name.to_string()),
            description: description.map(str::to_string),
            object_id: Some(next_object_id()),
            ..RemoteDescriptor::default()
        })
    }

    /// `undefined`.
    #[must_use]
    pub fn undefined() -> Self {
        Self::primitive("undefined", None)
    }

    /// `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "object".to_string(),
            subtype: Some("null".to_string()),
            value: Some(Value::Null),
            ..RemoteDescriptor::default()
        })
    }

    /// A boolean.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::primitive("boolean", Some(Value::Bool(value)))
    }

    /// A string.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive("string", Some(Value::String(value.into())))
    }

    /// An integer.
    #[must_use]
    pub fn number(value: impl Into<Number>) -> Self {
        Self::primitive("number", Some(Value::Number(value.into())))
    }

    /// A float; non-finite input becomes an unserializable number.
    #[must_use]
    pub fn float(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => Self::primitive("number", Some(Value::Number(n))),
            None if value.is_nan() => Self::unserializable_number("NaN"),
            None if value > 0.0 => Self::unserializable_number("Infinity"),
            None => Self::unserializable_number("-Infinity"),
        }
    }

    /// A number JSON cannot hold: `Infinity`, `-Infinity`, `NaN`, `-0`.
    #[must_use]
    pub fn unserializable_number(text: &str) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "number".to_string(),
            unserializable_value: Some(text.to_string()),
            description: Some(text.to_string()),
            ..RemoteDescriptor::default()
        })
    }

    /// A BigInt given in source form, e.g. `123n`.
    #[must_use]
    pub fn bigint(text: &str) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "bigint".to_string(),
            unserializable_value: Some(text.to_string()),
            description: Some(text.to_string()),
            ..RemoteDescriptor::default()
        })
    }

    /// A symbol with description `Symbol(<description>)`.
    #[must_use]
    pub fn symbol(description: &str) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "symbol".to_string(),
            description: Some(format!("Symbol({description})")),
            object_id: Some(next_object_id()),
            ..RemoteDescriptor::default()
        })
    }

    /// A function.
    #[must_use]
    pub fn function(source: &str) -> Self {
        Self::from_descriptor(RemoteDescriptor {
            value_type: "function".to_string(),
            class_name: Some("Function".to_string()),
            description: Some(source.to_string()),
            object_id: Some(next_object_id()),
            ..RemoteDescriptor::default()
        })
    }

    /// A regular expression, e.g. `/ab+c/g`.
    #[must_use]
    pub fn regexp(source: &str) -> Self {
        Self::object(Some("regexp"), "RegExp", Some(source))
    }

    /// A date with its string form.
    #[must_use]
    pub fn date(text: &str) -> Self {
        Self::object(Some("date"), "Date", Some(text))
    }

    /// An error with its stack description.
    #[must_use]
    pub fn error(description: &str) -> Self {
        Self::object(Some("error"), "Error", Some(description))
    }

    /// The window proxy.
    #[must_use]
    pub fn window() -> Self {
        Self::object(None, "Window", Some("Window"))
    }

    /// An object of a class with no dedicated wire form.
    #[must_use]
    pub fn other_object(subtype: Option<&str>, class_name: &str) -> Self {
        Self::object(subtype, class_name, Some(class_name))
    }

    /// An array.
    #[must_use]
    pub fn array(items: Vec<MemoryHandle>) -> Self {
        let description = format!("Array({})", items.len());
        let mut handle = Self::object(Some("array"), "Array", Some(&description));
        handle.properties = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), Arc::new(item)))
            .collect();
        handle
    }

    /// A plain object; keys keep their given order.
    #[must_use]
    pub fn plain_object(entries: Vec<(&str, MemoryHandle)>) -> Self {
        let mut handle = Self::object(None, "Object", Some("Object"));
        handle.properties = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), Arc::new(v)))
            .collect();
        handle
    }

    /// An HTML element.
    #[must_use]
    pub fn element(
        local_name: &str,
        attributes: &[(&str, &str)],
        children: Vec<MemoryHandle>,
    ) -> Self {
        let mut handle = Self::object(Some("node"), "HTMLElement", Some(local_name));
        handle.element = true;
        handle.node = Some(MemoryNode {
            node_type: 1,
            node_value: None,
            local_name: Some(local_name.to_string()),
            namespace_uri: Some(XHTML_NAMESPACE.to_string()),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: children.into_iter().map(Arc::new).collect(),
            shadow_root: None,
        });
        handle
    }

    /// A text node.
    #[must_use]
    pub fn text(content: &str) -> Self {
        let mut handle = Self::object(Some("node"), "Text", Some("#text"));
        handle.node = Some(MemoryNode {
            node_type: 3,
            node_value: Some(content.to_string()),
            local_name: None,
            namespace_uri: None,
            attributes: Vec::new(),
            children: Vec::new(),
            shadow_root: None,
        });
        handle
    }

    /// A shadow root (document fragment).
    #[must_use]
    pub fn shadow(children: Vec<MemoryHandle>) -> Self {
        let mut handle = Self::object(Some("node"), "ShadowRoot", Some("#document-fragment"));
        handle.node = Some(MemoryNode {
            node_type: 11,
            node_value: None,
            local_name: None,
            namespace_uri: None,
            attributes: Vec::new(),
            children: children.into_iter().map(Arc::new).collect(),
            shadow_root: None,
        });
        handle
    }

    /// Adds an own property after the existing ones.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: MemoryHandle) -> Self {
        self.properties.push((key.to_string(), Arc::new(value)));
        self
    }

    /// Attaches a shadow root to this node.
    #[must_use]
    pub fn with_shadow_root(mut self, root: MemoryHandle) -> Self {
        if let Some(node) = self.node.as_mut() {
            node.shadow_root = Some(Arc::new(root));
        }
        self
    }

    /// Makes further element actions fail as if the node left the DOM.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    /// Element actions performed so far.
    #[must_use]
    pub fn actions(&self) -> Vec<ElementAction> {
        self.actions.lock().clone()
    }

    /// Number of browser round trips made through this handle.
    #[must_use]
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    fn round_trip(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }

    fn node(&self) -> Result<&MemoryNode> {
        self.node
            .as_ref()
            .ok_or_else(|| Error::browser("Evaluation failed: TypeError: not a node"))
    }

    fn act(&self, action: ElementAction) -> Result<()> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(Error::browser("Node is detached from document"));
        }
        self.actions.lock().push(action);
        Ok(())
    }
}

#[async_trait]
impl JsHandle for MemoryHandle {
    fn descriptor(&self) -> &RemoteDescriptor {
        &self.descriptor
    }

    async fn properties(&self) -> Result<Vec<(String, Arc<dyn JsHandle>)>> {
        self.round_trip();
        Ok(self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v) as Arc<dyn JsHandle>))
            .collect())
    }

    async fn node_metadata(&self) -> Result<NodeMetadata> {
        self.round_trip();
        let node = self.node()?;
        Ok(NodeMetadata {
            node_type: node.node_type,
            node_value: node.node_value.clone(),
            local_name: node.local_name.clone(),
            namespace_uri: node.namespace_uri.clone(),
            child_node_count: node.children.len(),
            attribute_count: node.attributes.len(),
            has_shadow_root: node.shadow_root.is_some(),
        })
    }

    async fn child_node(&self, index: usize) -> Result<Arc<dyn JsHandle>> {
        self.round_trip();
        // A vanished child reads back as undefined, like `childNodes[i]` would
        Ok(match self.node()?.children.get(index) {
            Some(child) => Arc::clone(child) as Arc<dyn JsHandle>,
            None => Arc::new(Self::undefined()),
        })
    }

    async fn attribute(&self, index: usize) -> Result<(String, String)> {
        self.round_trip();
        self.node()?
            .attributes
            .get(index)
            .cloned()
            .ok_or_else(|| Error::browser(format!("no attribute at index {index}")))
    }

    async fn shadow_root(&self) -> Result<Option<Arc<dyn JsHandle>>> {
        self.round_trip();
        Ok(self
            .node()?
            .shadow_root
            .clone()
            .map(|r| r as Arc<dyn JsHandle>))
    }

    fn as_element(&self) -> Option<&dyn ElementHandle> {
        if self.element { Some(self) } else { None }
    }
}

#[async_trait]
impl ElementHandle for MemoryHandle {
    async fn click(&self) -> Result<()> {
        self.act(ElementAction::Click)
    }

    async fn type_text(&self, text: &str, options: &TypeOptions) -> Result<()> {
        self.act(ElementAction::Type {
            text: text.to_string(),
            delay_ms: options.delay_ms,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_opens_blank_page() {
        let launcher = MemoryLauncher::new();
        let browser = launcher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        assert!(browser.is_connected());

        let launched = launcher.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].pages().len(), 1);
        assert_eq!(launched[0].pages()[0].url(), "about:blank");
    }

    #[tokio::test]
    async fn test_failing_launcher() {
        let launcher = MemoryLauncher::failing("no chrome binary");
        let err = launcher
            .launch(&LaunchOptions::default())
            .await
            .err()
            .expect("should fail");
        assert_eq!(err.to_string(), "failed to launch browser: no chrome binary");
    }

    #[tokio::test]
    async fn test_targets_include_browser_and_workers() {
        let browser = MemoryBrowser::new();
        browser.open_page(None);
        browser.add_target(TargetKind::ServiceWorker, "https://example.com/sw.js");

        let kinds: Vec<_> = browser
            .targets()
            .await
            .expect("targets")
            .iter()
            .map(|t| t.info().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![TargetKind::Browser, TargetKind::Page, TargetKind::ServiceWorker]
        );
    }

    #[tokio::test]
    async fn test_page_close_emits_destroyed() {
        let browser = MemoryBrowser::new();
        let mut events = browser.events();
        let page = browser.open_page(None);
        let _ = events.recv().await;

        page.close().await.expect("close");
        match events.recv().await {
            Some(BrowserEvent::TargetDestroyed(info)) => assert_eq!(&info.id, page.id()),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(browser.pages().is_empty());
    }

    #[tokio::test]
    async fn test_goto_emits_load() {
        let browser = MemoryBrowser::new();
        let page = browser.open_page(None);
        let mut events = page.events();

        page.goto("https://example.com/", &GotoOptions::default())
            .await
            .expect("goto");
        assert!(matches!(events.recv().await, Some(PageEvent::Load)));
        assert_eq!(page.url(), "https://example.com/");
    }

    #[tokio::test]
    async fn test_detached_element_click_fails() {
        let el = MemoryHandle::element("button", &[], vec![]);
        el.detach();
        let err = el.click().await.expect_err("detached");
        assert_eq!(err.to_string(), "Node is detached from document");
    }

    #[tokio::test]
    async fn test_missing_child_reads_undefined() {
        let el = MemoryHandle::element("div", &[], vec![]);
        let child = el.child_node(3).await.expect("child");
        assert_eq!(child.descriptor().value_type, "undefined");
    }
}
