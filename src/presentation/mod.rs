// SPDX-License-Identifier: GPL-3.0-only

//! Presentation collaborators driven by the panel.
//!
//! The panel never renders anything. It calls into these traits, which a
//! host adapter implements on top of its own toolkit. None of them carry
//! business logic: they receive already-decided state.
//!
//! - [`Indicator`]: status-area icon and property menu
//! - [`InputPanel`]: candidate popup near the caret
//! - [`Keyboard`]: on-screen keyboard suggestion strip
//! - [`Menu`]: popup menu opened by `ExecMenu`
//! - [`ShellServices`]: shell-wide operations such as layout group locking
//!
//! [`headless`] provides logging implementations for running without a shell.

pub mod headless;

use crate::properties::{IndicatorIcon, PropertyDiff};
use crate::protocol::Property;
use crate::state::Spot;

/// Status-area indicator.
pub trait Indicator {
    /// Full property list after a `RegisterProperties` batch, with what changed.
    fn update_properties(&mut self, properties: &[Property], diff: &PropertyDiff);

    /// A single property changed.
    fn update_property(&mut self, property: &Property);

    /// The input method is active; show `icon`.
    fn activate(&mut self, icon: &IndicatorIcon);

    /// No input method is active.
    fn deactivate(&mut self);
}

/// Candidate popup.
pub trait InputPanel {
    fn set_aux_text(&mut self, text: &str);
    fn hide_aux(&mut self);
    fn set_preedit_text(&mut self, text: &str, caret: i32);
    fn hide_preedit(&mut self);
    fn set_lookup_table(&mut self, labels: &[String], texts: &[String], visible: bool);
    /// `cursor` may be outside the table; implementations clamp.
    fn set_lookup_table_cursor(&mut self, cursor: i32);
    fn update_position(&mut self, spot: &Spot);
    fn set_vertical(&mut self, vertical: bool);
    fn update_font(&mut self, style: &str);
}

/// On-screen keyboard integration.
pub trait Keyboard {
    fn set_suggestions(&mut self, texts: &[String]);
    fn reset_suggestions(&mut self);
    fn is_visible(&self) -> bool;
    /// Latch the kana toggle key.
    fn set_kana_active(&mut self, active: bool);
}

/// Popup menu listing properties for the user to trigger.
pub trait Menu {
    /// Replaces the menu items and opens the menu when non-empty.
    fn exec_menu(&mut self, properties: &[Property]);
}

/// Shell-wide services outside the panel.
pub trait ShellServices {
    /// Locks the keyboard layout to group `index`.
    fn lock_layout_group(&mut self, index: i32);
}

/// All collaborators, injected into the panel at construction.
pub struct Presentation {
    pub indicator: Box<dyn Indicator>,
    pub input_panel: Box<dyn InputPanel>,
    pub keyboard: Box<dyn Keyboard>,
    pub menu: Box<dyn Menu>,
    pub shell: Box<dyn ShellServices>,
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("keyboard_visible", &self.keyboard.is_visible())
            .finish_non_exhaustive()
    }
}
