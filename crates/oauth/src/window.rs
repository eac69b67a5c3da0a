//! Browser window primitives the handshake needs, expressed as traits, plus an in-process
//! implementation.
//!
//! The opener window's message listener is a [`MessageBus`] subscription: subscribing adds a
//! listener, dropping the receiver removes it.

use crate::error::OAuthError;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

const BUS_CAPACITY: usize = 64;

/// A message delivered to the opener window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    /// Origin of the window that sent the message.
    pub origin: String,
    /// Name of the sending window, when known.
    pub source: Option<String>,
    pub data: Value,
}

#[derive(Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<WindowMessage>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.tx.subscribe()
    }

    /// Delivers to every current listener and returns how many there were.
    pub fn dispatch(&self, message: WindowMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("listeners", &self.tx.receiver_count())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupFeatures {
    pub width: u32,
    pub height: u32,
    pub scrollbars: bool,
    pub resizable: bool,
}

impl Default for PopupFeatures {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            scrollbars: true,
            resizable: true,
        }
    }
}

impl PopupFeatures {
    /// `window.open` feature string, e.g. `width=600,height=600,scrollbars=yes,resizable=yes`.
    pub fn to_feature_string(&self) -> String {
        let flag = |on: bool| if on { "yes" } else { "no" };
        format!(
            "width={},height={},scrollbars={},resizable={}",
            self.width,
            self.height,
            flag(self.scrollbars),
            flag(self.resizable)
        )
    }
}

pub trait Popup: Send + Sync {
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// The window that opens OAuth popups and listens for their messages.
pub trait PopupHost: Send + Sync {
    type Popup: Popup;

    /// The application's own origin; only messages from it are trusted.
    fn origin(&self) -> &str;

    fn open(
        &self,
        url: &Url,
        name: &str,
        features: &PopupFeatures,
    ) -> Result<Self::Popup, OAuthError>;

    fn listen(&self) -> broadcast::Receiver<WindowMessage>;
}

/// `window.opener` as seen from inside a popup.
pub trait Opener: Send + Sync {
    fn is_closed(&self) -> bool;

    /// Posts `data`; the browser drops it unless the opener's origin equals `target_origin`.
    fn post_message(&self, data: Value, target_origin: &str);
}

/// A popup opened by [`LocalWindows`].
#[derive(Debug, Clone)]
pub struct OpenedPopup {
    pub name: String,
    pub url: Url,
    pub features: PopupFeatures,
    pub popup: LocalPopup,
}

/// In-process model of an opener window and the popups it opens.
#[derive(Clone)]
pub struct LocalWindows {
    origin: String,
    bus: MessageBus,
    closed: Arc<AtomicBool>,
    opened: broadcast::Sender<OpenedPopup>,
}

impl LocalWindows {
    pub fn new(origin: impl Into<String>) -> Self {
        let (opened, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            origin: origin.into(),
            bus: MessageBus::new(),
            closed: Arc::new(AtomicBool::new(false)),
            opened,
        }
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Notifies of every popup opened after the call.
    pub fn on_open(&self) -> broadcast::Receiver<OpenedPopup> {
        self.opened.subscribe()
    }

    /// Closes the opener window itself; popups see `opener.closed == true` afterwards.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// An opener handle for a window at `sender_origin`, named `source`.
    pub fn opener_for(&self, sender_origin: &str, source: Option<&str>) -> LocalOpener {
        LocalOpener {
            bus: self.bus.clone(),
            opener_origin: self.origin.clone(),
            sender_origin: sender_origin.to_string(),
            source: source.map(String::from),
            closed: self.closed.clone(),
        }
    }
}

impl PopupHost for LocalWindows {
    type Popup = LocalPopup;

    fn origin(&self) -> &str {
        &self.origin
    }

    fn open(
        &self,
        url: &Url,
        name: &str,
        features: &PopupFeatures,
    ) -> Result<LocalPopup, OAuthError> {
        let popup = LocalPopup {
            name: name.to_string(),
            closed: Arc::new(AtomicBool::new(false)),
            opener: self.opener_for(&self.origin, Some(name)),
        };
        debug!(name, features = %features.to_feature_string(), "Opened popup");
        let _ = self.opened.send(OpenedPopup {
            name: name.to_string(),
            url: url.clone(),
            features: *features,
            popup: popup.clone(),
        });
        Ok(popup)
    }

    fn listen(&self) -> broadcast::Receiver<WindowMessage> {
        self.bus.subscribe()
    }
}

#[derive(Debug, Clone)]
pub struct LocalPopup {
    name: String,
    closed: Arc<AtomicBool>,
    opener: LocalOpener,
}

impl LocalPopup {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `window.opener` from inside this popup.
    pub fn opener(&self) -> &LocalOpener {
        &self.opener
    }
}

impl Popup for LocalPopup {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(name = %self.name, "Closed popup");
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalOpener {
    bus: MessageBus,
    opener_origin: String,
    sender_origin: String,
    source: Option<String>,
    closed: Arc<AtomicBool>,
}

impl Opener for LocalOpener {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn post_message(&self, data: Value, target_origin: &str) {
        if target_origin != "*" && target_origin != self.opener_origin {
            debug!(target_origin, "Dropped message for mismatched target origin");
            return;
        }
        self.bus.dispatch(WindowMessage {
            origin: self.sender_origin.clone(),
            source: self.source.clone(),
            data,
        });
    }
}
