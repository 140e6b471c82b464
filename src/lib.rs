// SPDX-License-Identifier: GPL-3.0-only

//! kimpanel - an input method panel service for the kimpanel D-Bus protocol
//!
//! Input method frameworks such as Fcitx talk to a desktop panel over the
//! session bus: they push preedit text, candidate pages and status properties,
//! and the panel sends back candidate selections and paging requests. This
//! crate is the panel side of that conversation.
//!
//! # Architecture
//!
//! Bus traffic is decoded into [`panel::PanelEvent`]s by the [`dbus`] layer
//! and delivered over a channel to a single [`panel::Kimpanel`], which owns
//! all state and drives the [`presentation`] collaborators. When an on-screen
//! keyboard is visible the panel pages through the whole candidate table to
//! offer a flat suggestion list, see [`suggestions`].
//!
//! # Modules
//!
//! - `app_settings`: Bus names, object paths and defaults
//! - `config`: User configuration persisted as JSON
//! - `dbus`: Session bus interfaces, subscriptions and the outbound sink
//! - `panel`: The panel session and its event handling
//! - `presentation`: Collaborator traits and headless implementations
//! - `properties`: Property registry and indicator icon selection
//! - `protocol`: Wire message and property codecs
//! - `service`: Binding to the active input method service
//! - `state`: Panel state store
//! - `suggestions`: Lookup table paging and suggestion reconciliation

pub mod app_settings;
pub mod config;
pub mod dbus;
pub mod panel;
pub mod presentation;
pub mod properties;
pub mod protocol;
pub mod service;
pub mod state;
pub mod suggestions;

pub use config::PanelConfig;
pub use panel::{Kimpanel, PanelEvent, ProtocolSink};

// ============================================================================
// Integration Tests
// ============================================================================
