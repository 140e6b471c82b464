// SPDX-License-Identifier: GPL-3.0-only

//! The panel session.
//!
//! [`Kimpanel`] owns the panel state, the service binding and the suggestion
//! session, and is the only thing that mutates them. Events from the bus are
//! fed in one at a time through [`Kimpanel::handle_event`]; UI-originated
//! requests come in through the public methods. Presentation is updated
//! through the injected [`Presentation`] collaborators, and everything bound
//! for the input method goes through a [`ProtocolSink`].

use crate::config::PanelConfig;
use crate::properties::is_kana_active;
use crate::presentation::Presentation;
use crate::protocol::{InboundCall, InboundSignal, LayoutHint, OutboundSignal, Property};
use crate::service::{NameWatcher, ServiceTracker};
use crate::state::PanelState;
use crate::suggestions::{PagingRequest, SuggestionSession};

/// Outgoing protocol actions. Fire-and-forget.
pub trait ProtocolSink {
    fn emit(&mut self, signal: OutboundSignal);

    /// Asks the Fcitx controller to toggle the active input method.
    fn toggle_input_method(&mut self);
}

/// Everything the dispatch loop can deliver to the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// A signal from an input method, with its unique sender name.
    Signal {
        sender: Option<String>,
        signal: InboundSignal,
    },
    /// A method call on `org.kde.impanel2`.
    Call(InboundCall),
    /// A watched service left the bus.
    ServiceVanished(String),
    /// The panel now owns its well-known bus name.
    NameAcquired,
    /// `org.fcitx.GnomeHelper.LockXkbGroup`.
    LockXkbGroup(i32),
}

pub struct Kimpanel {
    config: PanelConfig,
    state: PanelState,
    tracker: ServiceTracker,
    suggestions: SuggestionSession,
    presentation: Presentation,
    sink: Box<dyn ProtocolSink>,
    destroyed: bool,
}

impl std::fmt::Debug for Kimpanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kimpanel")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("tracker", &self.tracker)
            .field("suggestions", &self.suggestions)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Kimpanel {
    pub fn new(
        config: PanelConfig,
        presentation: Presentation,
        sink: Box<dyn ProtocolSink>,
        watcher: Box<dyn NameWatcher>,
    ) -> Self {
        let mut panel = Self {
            suggestions: SuggestionSession::new(config.max_search_pages),
            config,
            state: PanelState::new(),
            tracker: ServiceTracker::new(watcher),
            presentation,
            sink,
            destroyed: false,
        };

        let vertical = panel.is_lookup_table_vertical();
        let style = panel.text_style();
        panel.presentation.input_panel.set_vertical(vertical);
        panel.presentation.input_panel.update_font(&style);
        panel.presentation.indicator.deactivate();
        panel
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn suggestions(&self) -> &SuggestionSession {
        &self.suggestions
    }

    pub fn current_service(&self) -> Option<&str> {
        self.tracker.current()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Processes one event from the bus.
    pub fn handle_event(&mut self, event: PanelEvent) {
        if self.destroyed {
            return;
        }

        match event {
            PanelEvent::Signal { sender, signal } => self.handle_signal(sender.as_deref(), signal),
            PanelEvent::Call(call) => self.handle_call(call),
            PanelEvent::ServiceVanished(name) => self.service_vanished(&name),
            PanelEvent::NameAcquired => {
                tracing::info!("Panel name acquired, announcing panel");
                self.sink.emit(OutboundSignal::PanelCreated);
                self.sink.emit(OutboundSignal::PanelCreated2);
            }
            PanelEvent::LockXkbGroup(index) => {
                self.presentation.shell.lock_layout_group(index)
            }
        }
    }

    fn handle_signal(&mut self, sender: Option<&str>, signal: InboundSignal) {
        tracing::debug!("Signal from {:?}: {:?}", sender, signal);

        let changed = match signal {
            InboundSignal::ExecMenu(keys) => {
                let properties = Property::parse_all(&keys);
                self.presentation.menu.exec_menu(&properties);
                false
            }
            InboundSignal::RegisterProperties(keys) => {
                if let Some(sender) = sender {
                    if self.tracker.register(sender) {
                        self.suggestions.abandon();
                    }
                }
                let diff = self.state.properties.replace_all(Property::parse_all(&keys));
                self.presentation
                    .indicator
                    .update_properties(self.state.properties.as_slice(), &diff);
                false
            }
            InboundSignal::UpdateProperty(raw) => {
                match Property::parse(&raw) {
                    Some(property) => {
                        self.presentation.keyboard.set_kana_active(is_kana_active(&property));
                        self.presentation.indicator.update_property(&property);
                        self.state.properties.update(property);
                    }
                    None => tracing::warn!("Dropping malformed property string: {:?}", raw),
                }
                self.sync_indicator();
                false
            }
            InboundSignal::UpdateSpotLocation { x, y } => self.state.set_spot_location(x, y),
            InboundSignal::UpdatePreeditText { text, .. } => self.state.set_preedit_text(&text),
            InboundSignal::UpdateAux { text, .. } => self.state.set_aux(&text),
            InboundSignal::UpdateLookupTableCursor(cursor) => self.state.set_cursor(cursor),
            InboundSignal::UpdatePreeditCaret(caret) => self.state.set_preedit_caret(caret),
            InboundSignal::ShowPreedit(show) => self.state.set_show_preedit(show),
            InboundSignal::ShowLookupTable(show) => self.state.set_show_lookup_table(show),
            InboundSignal::ShowAux(show) => self.state.set_show_aux(show),
            InboundSignal::Enable(enabled) => {
                self.state.set_enabled(enabled);
                self.sync_indicator();
                false
            }
        };

        if changed {
            self.update_input_panel();
        }
    }

    fn handle_call(&mut self, call: InboundCall) {
        tracing::debug!("Call: {:?}", call);

        let changed = match call {
            InboundCall::SetSpotRect { x, y, w, h } => self.state.set_spot(x, y, w, h, false, 1.0),
            InboundCall::SetRelativeSpotRect { x, y, w, h } => {
                self.state.set_spot(x, y, w, h, true, 1.0)
            }
            InboundCall::SetRelativeSpotRectV2 { x, y, w, h, scale } => {
                self.state.set_spot(x, y, w, h, true, scale)
            }
            InboundCall::SetLookupTable(page) => {
                self.set_lookup_table(page);
                return;
            }
        };

        if changed {
            self.update_input_panel();
        }
    }

    fn set_lookup_table(&mut self, page: crate::protocol::LookupTablePage) {
        if self.state.set_lookup_table(page) {
            self.suggestions.reset();
        }

        let keyboard_visible = self.presentation.keyboard.is_visible();
        let request = self.suggestions.on_page(&self.state.lookup_table, keyboard_visible);
        self.execute(request);

        if keyboard_visible {
            self.presentation
                .keyboard
                .set_suggestions(self.suggestions.accumulated());
        } else {
            let vertical = self.is_lookup_table_vertical();
            self.presentation.input_panel.set_vertical(vertical);
            self.update_input_panel();
        }
    }

    fn service_vanished(&mut self, name: &str) {
        if !self.tracker.on_name_vanished(name) {
            return;
        }

        self.state.reset();
        self.suggestions.abandon();
        let diff = self.state.properties.clear();
        self.presentation.indicator.update_properties(&[], &diff);
        self.sync_indicator();
        self.update_input_panel();
    }

    fn execute(&mut self, request: Option<PagingRequest>) {
        match request {
            Some(PagingRequest::PageUp) => self.lookup_page_up(),
            Some(PagingRequest::PageDown) => self.lookup_page_down(),
            Some(PagingRequest::Select(index)) => match i32::try_from(index) {
                Ok(index) => self.select_candidate(index),
                Err(_) => tracing::warn!("Candidate index {} out of range", index),
            },
            None => {}
        }
    }

    fn sync_indicator(&mut self) {
        if self.state.enabled {
            let icon = self.state.properties.indicator_icon(true);
            self.presentation.indicator.activate(&icon);
        } else {
            self.presentation.indicator.deactivate();
        }
    }

    /// Pushes the current state to the input panel.
    ///
    /// Skipped while the on-screen keyboard is showing suggestions instead.
    pub fn update_input_panel(&mut self) {
        if self.presentation.keyboard.is_visible() {
            return;
        }

        let state = &self.state;
        let panel = &mut self.presentation.input_panel;

        if state.show_aux {
            panel.set_aux_text(&state.aux);
        } else {
            panel.hide_aux();
        }
        if state.show_preedit {
            panel.set_preedit_text(&state.preedit.text, state.preedit.caret);
        } else {
            panel.hide_preedit();
        }
        panel.set_lookup_table(
            &state.lookup_table.labels,
            &state.lookup_table.texts,
            state.show_lookup_table,
        );
        panel.set_lookup_table_cursor(state.lookup_table.cursor);
        panel.update_position(&state.spot);
    }

    // ------------------------------------------------------------------------
    // Requests from presentation
    // ------------------------------------------------------------------------

    /// Selects a candidate on the loaded page by index.
    pub fn select_candidate(&mut self, index: i32) {
        self.sink.emit(OutboundSignal::SelectCandidate(index));
        self.suggestions.reset();
        self.state.clear_lookup_table();
        self.presentation.keyboard.reset_suggestions();
    }

    /// Selects a candidate by its text, paging as needed to find it.
    pub fn select_candidate_text(&mut self, text: &str) {
        let request = self.suggestions.select_by_text(text, &self.state.lookup_table);
        self.execute(request);
    }

    pub fn trigger_property(&mut self, key: &str) {
        self.sink.emit(OutboundSignal::TriggerProperty(key.to_owned()));
    }

    pub fn toggle_im(&mut self) {
        self.sink.toggle_input_method();
    }

    pub fn move_preedit_caret(&mut self, position: i32) {
        self.sink.emit(OutboundSignal::MovePreeditCaret(position));
    }

    pub fn lookup_page_up(&mut self) {
        self.sink.emit(OutboundSignal::LookupTablePageUp);
    }

    pub fn lookup_page_down(&mut self) {
        self.sink.emit(OutboundSignal::LookupTablePageDown);
    }

    /// Opens the input method's configuration tool.
    pub fn request_configure(&mut self) {
        self.sink.emit(OutboundSignal::Configure);
    }

    pub fn request_reload_config(&mut self) {
        self.sink.emit(OutboundSignal::ReloadConfig);
    }

    pub fn request_exit(&mut self) {
        self.sink.emit(OutboundSignal::Exit);
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Whether candidates should be laid out vertically.
    pub fn is_lookup_table_vertical(&self) -> bool {
        match self.state.lookup_table.layout {
            LayoutHint::NotSet => self.config.vertical,
            LayoutHint::Vertical => true,
            LayoutHint::Horizontal => false,
        }
    }

    /// Style string for the configured font.
    pub fn text_style(&self) -> String {
        self.config.text_style()
    }

    /// Applies a new configuration, pushing only what changed.
    pub fn apply_config(&mut self, config: PanelConfig) {
        let vertical_changed = config.vertical != self.config.vertical;
        let font_changed = config.font != self.config.font;

        self.suggestions.set_max_search_pages(config.max_search_pages);
        self.config = config;

        if vertical_changed {
            let vertical = self.is_lookup_table_vertical();
            self.presentation.input_panel.set_vertical(vertical);
        }
        if font_changed {
            let style = self.text_style();
            self.presentation.input_panel.update_font(&style);
        }
    }

    /// Tears the session down. Later events are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.state.reset();
        self.suggestions.abandon();
        self.update_input_panel();
        self.tracker.teardown();
        self.destroyed = true;
        tracing::info!("Panel session destroyed");
    }
}

// ============================================================================
// Tests
// ============================================================================
