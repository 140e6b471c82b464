// SPDX-License-Identifier: GPL-3.0-only

//! Outbound protocol traffic.
//!
//! [`DbusSink`] is the bus side of [`ProtocolSink`]. Requests are queued on an
//! unbounded channel and sent in order by a single emitter task, so the
//! panel never waits on the bus.

use super::{DbusError, DbusResult, Impanel2Interface, ImpanelInterface, Subscription};
use crate::app_settings::{FCITX_BUS_NAME, FCITX_CONTROLLER_PATH, PANEL_PATH};
use crate::panel::ProtocolSink;
use crate::protocol::OutboundSignal;
use futures::channel::mpsc;
use futures::StreamExt;
use zbus::object_server::SignalEmitter;

/// Fcitx 5 controller, used to toggle the active input method.
#[zbus::proxy(interface = "org.fcitx.Fcitx.Controller1")]
trait FcitxController {
    /// Toggle between the first and the active input method.
    async fn toggle(&self) -> zbus::Result<()>;
}

/// Work for the emitter task.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkCommand {
    Emit(OutboundSignal),
    ToggleInputMethod,
}

/// Sends panel requests onto the session bus.
#[derive(Debug)]
pub struct DbusSink {
    commands: mpsc::UnboundedSender<SinkCommand>,
    _emitter: Subscription,
}

impl DbusSink {
    /// Starts the emitter task on `connection`.
    pub fn spawn(connection: zbus::Connection) -> Self {
        let (commands, rx) = mpsc::unbounded();
        Self {
            commands,
            _emitter: Subscription::spawn(run_emitter(connection, rx)),
        }
    }

    fn queue(&self, command: SinkCommand) {
        if let Err(e) = self.commands.unbounded_send(command) {
            tracing::error!("Failed to queue outbound request: {}", e);
        }
    }
}

impl ProtocolSink for DbusSink {
    fn emit(&mut self, signal: OutboundSignal) {
        self.queue(SinkCommand::Emit(signal));
    }

    fn toggle_input_method(&mut self) {
        self.queue(SinkCommand::ToggleInputMethod);
    }
}

async fn run_emitter(
    connection: zbus::Connection,
    mut commands: mpsc::UnboundedReceiver<SinkCommand>,
) {
    while let Some(command) = commands.next().await {
        let result = match &command {
            SinkCommand::Emit(signal) => emit_signal(&connection, signal).await,
            SinkCommand::ToggleInputMethod => toggle_input_method(&connection).await,
        };
        if let Err(e) = result {
            tracing::warn!("{:?} failed: {}", command, e);
        }
    }
}

async fn emit_signal(connection: &zbus::Connection, signal: &OutboundSignal) -> DbusResult<()> {
    tracing::debug!("D-Bus: emitting {}.{}", signal.interface(), signal.member());

    let emitter = SignalEmitter::new(connection, PANEL_PATH)
        .map_err(|e| DbusError::MethodCallFailed(e.to_string()))?;

    let sent = match signal {
        OutboundSignal::MovePreeditCaret(position) => {
            ImpanelInterface::move_preedit_caret(&emitter, *position).await
        }
        OutboundSignal::SelectCandidate(index) => {
            ImpanelInterface::select_candidate(&emitter, *index).await
        }
        OutboundSignal::LookupTablePageUp => ImpanelInterface::lookup_table_page_up(&emitter).await,
        OutboundSignal::LookupTablePageDown => {
            ImpanelInterface::lookup_table_page_down(&emitter).await
        }
        OutboundSignal::TriggerProperty(key) => {
            ImpanelInterface::trigger_property(&emitter, key).await
        }
        OutboundSignal::PanelCreated => ImpanelInterface::panel_created(&emitter).await,
        OutboundSignal::Exit => ImpanelInterface::exit(&emitter).await,
        OutboundSignal::ReloadConfig => ImpanelInterface::reload_config(&emitter).await,
        OutboundSignal::Configure => ImpanelInterface::configure(&emitter).await,
        OutboundSignal::PanelCreated2 => Impanel2Interface::panel_created2(&emitter).await,
    };

    sent.map_err(|e| DbusError::MethodCallFailed(e.to_string()))
}

async fn toggle_input_method(connection: &zbus::Connection) -> DbusResult<()> {
    tracing::debug!("D-Bus: Fcitx Toggle()");
    let controller = FcitxControllerProxy::builder(connection)
        .destination(FCITX_BUS_NAME)?
        .path(FCITX_CONTROLLER_PATH)?
        .build()
        .await?;
    controller.toggle().await.map_err(DbusError::from)
}

// ============================================================================
// Tests
// ============================================================================
