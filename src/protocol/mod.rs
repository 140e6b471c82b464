// SPDX-License-Identifier: GPL-3.0-only

//! Protocol message codec for the kimpanel D-Bus protocol.
//!
//! This module maps wire payloads to typed values and back:
//!
//! - **Inbound signals** (`org.kde.kimpanel.inputmethod`): preedit, aux,
//!   spot and property updates from the input method.
//! - **Inbound calls** (`org.kde.impanel2`): spot rectangles and lookup
//!   table pages.
//! - **Outbound signals** (`org.kde.impanel`): candidate selection, paging
//!   and property triggers.
//! - **Properties**: the `key:label:icon:text[:hints]` string format.
//!
//! Malformed entries are dropped individually; nothing here is fatal.

pub mod message;
pub mod property;

pub use message::{
    DecodeError, InboundCall, InboundSignal, LayoutHint, LookupTablePage, OutboundSignal,
};
pub use property::{extract_label, Property};

/// Returns the first line of a candidate text.
///
/// Multi-line candidates carry an annotation after the first line break.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or(text)
}
