// SPDX-License-Identifier: GPL-3.0-only

//! Logging collaborators for running the panel without a shell.

use super::{Indicator, InputPanel, Keyboard, Menu, Presentation, ShellServices};
use crate::properties::{IndicatorIcon, PropertyDiff};
use crate::protocol::Property;
use crate::state::Spot;

/// Builds a full set of headless collaborators.
///
/// `keyboard_visible` decides whether the panel collects flattened
/// suggestions for the keyboard or drives the candidate popup.
pub fn presentation(keyboard_visible: bool) -> Presentation {
    Presentation {
        indicator: Box::new(LogIndicator),
        input_panel: Box::new(LogInputPanel::default()),
        keyboard: Box::new(LogKeyboard {
            visible: keyboard_visible,
        }),
        menu: Box::new(LogMenu),
        shell: Box::new(LogShell),
    }
}

#[derive(Debug, Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn update_properties(&mut self, properties: &[Property], diff: &PropertyDiff) {
        tracing::info!(
            "Indicator: {} properties (+{} ~{} -{})",
            properties.len(),
            diff.added.len(),
            diff.updated.len(),
            diff.removed.len()
        );
    }

    fn update_property(&mut self, property: &Property) {
        tracing::info!("Indicator: property {}", property);
    }

    fn activate(&mut self, icon: &IndicatorIcon) {
        tracing::info!("Indicator: active {:?}", icon);
    }

    fn deactivate(&mut self) {
        tracing::info!("Indicator: inactive");
    }
}

/// Logs the popup contents, and the resolved spot when it moves.
#[derive(Debug, Default)]
pub struct LogInputPanel {
    vertical: bool,
}

impl InputPanel for LogInputPanel {
    fn set_aux_text(&mut self, text: &str) {
        tracing::info!("Aux: {:?}", text);
    }

    fn hide_aux(&mut self) {
        tracing::debug!("Aux hidden");
    }

    fn set_preedit_text(&mut self, text: &str, caret: i32) {
        tracing::info!("Preedit: {:?} caret={}", text, caret);
    }

    fn hide_preedit(&mut self) {
        tracing::debug!("Preedit hidden");
    }

    fn set_lookup_table(&mut self, labels: &[String], texts: &[String], visible: bool) {
        if !visible {
            tracing::debug!("Lookup table hidden");
            return;
        }
        let entries: Vec<String> = labels
            .iter()
            .zip(texts)
            .map(|(label, text)| format!("{}{}", label, text))
            .collect();
        let separator = if self.vertical { "\n" } else { " " };
        tracing::info!("Candidates:{}{}", separator, entries.join(separator));
    }

    fn set_lookup_table_cursor(&mut self, cursor: i32) {
        tracing::debug!("Candidate cursor: {}", cursor);
    }

    fn update_position(&mut self, spot: &Spot) {
        let rect = spot.resolve(None, 1.0);
        tracing::debug!("Panel anchored at ({}, {}) {}x{}", rect.x, rect.y, rect.w, rect.h);
    }

    fn set_vertical(&mut self, vertical: bool) {
        self.vertical = vertical;
    }

    fn update_font(&mut self, style: &str) {
        tracing::debug!("Panel font: {}", style);
    }
}

#[derive(Debug, Default)]
pub struct LogKeyboard {
    visible: bool,
}

impl Keyboard for LogKeyboard {
    fn set_suggestions(&mut self, texts: &[String]) {
        tracing::info!("Suggestions: {}", texts.join(" "));
    }

    fn reset_suggestions(&mut self) {
        tracing::debug!("Suggestions cleared");
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_kana_active(&mut self, active: bool) {
        tracing::debug!("Kana latch: {}", active);
    }
}

#[derive(Debug, Default)]
pub struct LogMenu;

impl Menu for LogMenu {
    fn exec_menu(&mut self, properties: &[Property]) {
        for property in properties {
            tracing::info!("Menu item: {} ({})", property.label, property.key);
        }
    }
}

#[derive(Debug, Default)]
pub struct LogShell;

impl ShellServices for LogShell {
    fn lock_layout_group(&mut self, index: i32) {
        tracing::info!("Lock layout group {}", index);
    }
}
