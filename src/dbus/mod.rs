// SPDX-License-Identifier: GPL-3.0-only

//! Session bus surface of the panel.
//!
//! # Architecture
//!
//! The bus layer never touches panel state. Incoming traffic is turned into
//! [`PanelEvent`]s and sent over a channel to the dispatch loop; outgoing
//! traffic arrives through [`DbusSink`] and is emitted by a helper task.
//!
//! - **Server**: exports `org.kde.impanel` (signals only) and
//!   `org.kde.impanel2` at `/org/kde/impanel`, plus `org.fcitx.GnomeHelper` at
//!   `/org/fcitx/GnomeHelper`, and requests both well-known names.
//! - **Subscriptions**: input method signals on `org.kde.kimpanel.inputmethod`
//!   and name-owner watches for the bound service, see [`watcher`].
//! - **Sink**: outbound signals and the Fcitx controller, see [`sink`].
//!
//! If another panel already owns `org.kde.impanel` this instance stays
//! passive: it keeps listening but never announces itself.

pub mod sink;
pub mod watcher;

pub use sink::DbusSink;
pub use watcher::{DbusNameWatcher, Subscription};

use crate::app_settings::{
    HELPER_BUS_NAME, HELPER_PATH, INPUTMETHOD_INTERFACE, PANEL_BUS_NAME, PANEL_PATH,
};
use crate::panel::PanelEvent;
use crate::protocol::{InboundCall, InboundSignal, LookupTablePage};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::interface;
use zbus::object_server::SignalEmitter;

/// Forwards an event to the dispatch loop.
async fn forward(events: &mut mpsc::Sender<PanelEvent>, event: PanelEvent) {
    if let Err(e) = events.send(event).await {
        tracing::error!("Failed to forward bus event: {}", e);
    }
}

/// `org.kde.impanel`: signals from the panel to the input method.
#[derive(Debug, Default)]
pub struct ImpanelInterface;

#[interface(name = "org.kde.impanel")]
impl ImpanelInterface {
    #[zbus(signal)]
    async fn move_preedit_caret(emitter: &SignalEmitter<'_>, position: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn select_candidate(emitter: &SignalEmitter<'_>, index: i32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn lookup_table_page_up(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn lookup_table_page_down(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn trigger_property(emitter: &SignalEmitter<'_>, key: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn panel_created(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn exit(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn reload_config(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn configure(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;
}

/// `org.kde.impanel2`: calls from the input method to the panel.
pub struct Impanel2Interface {
    events: mpsc::Sender<PanelEvent>,
}

impl Impanel2Interface {
    pub fn new(events: mpsc::Sender<PanelEvent>) -> Self {
        Self { events }
    }
}

#[interface(name = "org.kde.impanel2")]
impl Impanel2Interface {
    pub async fn set_spot_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        tracing::debug!("D-Bus: SetSpotRect({}, {}, {}, {})", x, y, w, h);
        forward(
            &mut self.events,
            PanelEvent::Call(InboundCall::SetSpotRect { x, y, w, h }),
        )
        .await;
    }

    pub async fn set_relative_spot_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        tracing::debug!("D-Bus: SetRelativeSpotRect({}, {}, {}, {})", x, y, w, h);
        forward(
            &mut self.events,
            PanelEvent::Call(InboundCall::SetRelativeSpotRect { x, y, w, h }),
        )
        .await;
    }

    #[zbus(name = "SetRelativeSpotRectV2")]
    pub async fn set_relative_spot_rect_v2(&mut self, x: i32, y: i32, w: i32, h: i32, scale: f64) {
        tracing::debug!(
            "D-Bus: SetRelativeSpotRectV2({}, {}, {}, {}, {})",
            x,
            y,
            w,
            h,
            scale
        );
        forward(
            &mut self.events,
            PanelEvent::Call(InboundCall::SetRelativeSpotRectV2 { x, y, w, h, scale }),
        )
        .await;
    }

    pub async fn set_lookup_table(
        &mut self,
        labels: Vec<String>,
        texts: Vec<String>,
        attrs: Vec<String>,
        has_prev: bool,
        has_next: bool,
        cursor: i32,
        layout: i32,
    ) {
        tracing::debug!(
            "D-Bus: SetLookupTable({} entries, prev={}, next={}, cursor={}, layout={})",
            texts.len(),
            has_prev,
            has_next,
            cursor,
            layout
        );
        let page = LookupTablePage {
            labels,
            texts,
            attrs,
            has_prev,
            has_next,
            cursor,
            layout,
        };
        forward(&mut self.events, PanelEvent::Call(InboundCall::SetLookupTable(page))).await;
    }

    #[zbus(signal, name = "PanelCreated2")]
    async fn panel_created2(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;
}

/// `org.fcitx.GnomeHelper`: keyboard layout group locking.
pub struct GnomeHelperInterface {
    events: mpsc::Sender<PanelEvent>,
}

impl GnomeHelperInterface {
    pub fn new(events: mpsc::Sender<PanelEvent>) -> Self {
        Self { events }
    }
}

#[interface(name = "org.fcitx.GnomeHelper")]
impl GnomeHelperInterface {
    pub async fn lock_xkb_group(&mut self, index: i32) {
        tracing::debug!("D-Bus: LockXkbGroup({})", index);
        forward(&mut self.events, PanelEvent::LockXkbGroup(index)).await;
    }
}

/// Result type for D-Bus operations.
pub type DbusResult<T> = Result<T, DbusError>;

/// Errors that can occur during D-Bus operations.
#[derive(Debug, Clone)]
pub enum DbusError {
    /// Failed to connect to the session bus.
    ConnectionFailed(String),
    /// Failed to export an object or install a match rule.
    RegistrationFailed(String),
    /// A call on the bus failed.
    MethodCallFailed(String),
    /// The peer is not on the bus.
    ServiceUnavailable,
}

impl std::fmt::Display for DbusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbusError::ConnectionFailed(msg) => write!(f, "D-Bus connection failed: {}", msg),
            DbusError::RegistrationFailed(msg) => {
                write!(f, "D-Bus service registration failed: {}", msg)
            }
            DbusError::MethodCallFailed(msg) => write!(f, "D-Bus method call failed: {}", msg),
            DbusError::ServiceUnavailable => write!(f, "D-Bus service is not available"),
        }
    }
}

impl std::error::Error for DbusError {}

impl From<zbus::Error> for DbusError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::NameTaken => DbusError::ServiceUnavailable,
            zbus::Error::Address(_) | zbus::Error::InputOutput(_) | zbus::Error::Handshake(_) => {
                DbusError::ConnectionFailed(e.to_string())
            }
            other => DbusError::MethodCallFailed(other.to_string()),
        }
    }
}

/// D-Bus server handle for the panel.
///
/// Owns the session connection, the exported objects and the input method
/// signal subscription.
pub struct DbusServer {
    connection: zbus::Connection,
    owns_panel_name: bool,
    _signals: Subscription,
}

impl std::fmt::Debug for DbusServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbusServer")
            .field("owns_panel_name", &self.owns_panel_name)
            .finish_non_exhaustive()
    }
}

impl DbusServer {
    /// Connects to the session bus, exports the panel objects and starts
    /// forwarding input method traffic to `events`.
    ///
    /// Losing the race for a well-known name is not an error. When the panel
    /// name is acquired, [`PanelEvent::NameAcquired`] is sent.
    pub async fn start(mut events: mpsc::Sender<PanelEvent>) -> DbusResult<Self> {
        let connection = zbus::connection::Builder::session()
            .map_err(|e| DbusError::ConnectionFailed(e.to_string()))?
            .serve_at(PANEL_PATH, ImpanelInterface)
            .map_err(|e| DbusError::RegistrationFailed(e.to_string()))?
            .serve_at(PANEL_PATH, Impanel2Interface::new(events.clone()))
            .map_err(|e| DbusError::RegistrationFailed(e.to_string()))?
            .serve_at(HELPER_PATH, GnomeHelperInterface::new(events.clone()))
            .map_err(|e| DbusError::RegistrationFailed(e.to_string()))?
            .build()
            .await
            .map_err(|e| DbusError::ConnectionFailed(e.to_string()))?;

        tracing::info!("D-Bus objects exported at {} and {}", PANEL_PATH, HELPER_PATH);

        let signals = subscribe_input_method(&connection, events.clone()).await?;

        let owns_panel_name = request_name(&connection, PANEL_BUS_NAME).await;
        request_name(&connection, HELPER_BUS_NAME).await;

        if owns_panel_name {
            forward(&mut events, PanelEvent::NameAcquired).await;
        } else {
            tracing::warn!("Running passive: {} is owned elsewhere", PANEL_BUS_NAME);
        }

        Ok(Self {
            connection,
            owns_panel_name,
            _signals: signals,
        })
    }

    /// Get the D-Bus connection.
    pub fn connection(&self) -> &zbus::Connection {
        &self.connection
    }

    /// Whether this instance owns `org.kde.impanel`.
    pub fn owns_panel_name(&self) -> bool {
        self.owns_panel_name
    }
}

/// Requests a well-known name without queueing. Returns whether it is owned.
async fn request_name(connection: &zbus::Connection, name: &'static str) -> bool {
    match connection
        .request_name_with_flags(name, RequestNameFlags::DoNotQueue.into())
        .await
    {
        Ok(RequestNameReply::PrimaryOwner) | Ok(RequestNameReply::AlreadyOwner) => {
            tracing::info!("D-Bus name acquired: {}", name);
            true
        }
        Ok(reply) => {
            tracing::info!("D-Bus name {} not acquired: {:?}", name, reply);
            false
        }
        Err(zbus::Error::NameTaken) => {
            tracing::info!("D-Bus name {} is already taken", name);
            false
        }
        Err(e) => {
            tracing::warn!("Failed to request D-Bus name {}: {}", name, e);
            false
        }
    }
}

/// Subscribes to every signal on `org.kde.kimpanel.inputmethod`, from any
/// sender, and forwards the decoded ones.
async fn subscribe_input_method(
    connection: &zbus::Connection,
    mut events: mpsc::Sender<PanelEvent>,
) -> DbusResult<Subscription> {
    let rule = zbus::MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface(INPUTMETHOD_INTERFACE)
        .map_err(|e| DbusError::RegistrationFailed(e.to_string()))?
        .build();
    let mut stream = zbus::MessageStream::for_match_rule(rule, connection, None)
        .await
        .map_err(|e| DbusError::RegistrationFailed(e.to_string()))?;

    tracing::info!("Subscribed to {} signals", INPUTMETHOD_INTERFACE);

    Ok(Subscription::spawn(async move {
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Error on input method signal stream: {}", e);
                    continue;
                }
            };

            match InboundSignal::from_message(&message) {
                Ok(Some(signal)) => {
                    let sender = message.header().sender().map(|s| s.to_string());
                    if events.send(PanelEvent::Signal { sender, signal }).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Dropping input method signal: {}", e),
            }
        }
        tracing::debug!("Input method signal stream ended");
    }))
}

// ============================================================================
// Tests
// ============================================================================
