// SPDX-License-Identifier: GPL-3.0-only

//! Panel state store.
//!
//! Every setter compares against the current value and reports whether
//! anything changed, so the panel only pushes to presentation on change.
//! Setters never fail; out-of-range cursors are stored as given.

use crate::properties::PropertyRegistry;
use crate::protocol::{LayoutHint, LookupTablePage};

/// Caret or composition anchor rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Coordinates are offsets from the focused window.
    pub relative: bool,
    /// Scale the client used when reporting relative coordinates.
    pub scale: f64,
}

impl Default for Spot {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            relative: false,
            scale: 1.0,
        }
    }
}

/// Spot rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Spot {
    fn same_as(&self, other: &Spot) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.w == other.w
            && self.h == other.h
            && self.relative == other.relative
            && self.scale.to_bits() == other.scale.to_bits()
    }

    /// Resolves the spot to screen coordinates.
    ///
    /// Relative spots are offset by the focused window origin and scaled by
    /// `shell_scale / scale`. Without a focused window the raw values are used.
    pub fn resolve(&self, window_origin: Option<(f64, f64)>, shell_scale: f64) -> Rect {
        let raw = Rect {
            x: f64::from(self.x),
            y: f64::from(self.y),
            w: f64::from(self.w),
            h: f64::from(self.h),
        };

        match window_origin {
            Some((wx, wy)) if self.relative && self.scale > 0.0 => {
                let factor = shell_scale / self.scale;
                Rect {
                    x: wx + raw.x * factor,
                    y: wy + raw.y * factor,
                    w: raw.w * factor,
                    h: raw.h * factor,
                }
            }
            _ => raw,
        }
    }
}

/// Text being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preedit {
    pub text: String,
    pub caret: i32,
}

/// The currently loaded lookup table page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    pub labels: Vec<String>,
    pub texts: Vec<String>,
    /// Highlighted candidate, `-1` for none.
    pub cursor: i32,
    pub has_prev: bool,
    pub has_next: bool,
    pub layout: LayoutHint,
}

impl Default for LookupTable {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            texts: Vec::new(),
            cursor: -1,
            has_prev: false,
            has_next: false,
            layout: LayoutHint::NotSet,
        }
    }
}

impl LookupTable {
    /// Empty labels, or labels that are all empty, clear the table on the wire.
    pub fn is_clear(&self) -> bool {
        self.labels.iter().all(String::is_empty)
    }
}

impl From<LookupTablePage> for LookupTable {
    fn from(page: LookupTablePage) -> Self {
        Self {
            labels: page.labels,
            texts: page.texts,
            cursor: page.cursor,
            has_prev: page.has_prev,
            has_next: page.has_next,
            layout: LayoutHint::from(page.layout),
        }
    }
}

/// Authoritative panel state for one session.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub spot: Spot,
    pub preedit: Preedit,
    pub show_preedit: bool,
    pub aux: String,
    pub show_aux: bool,
    pub lookup_table: LookupTable,
    pub show_lookup_table: bool,
    pub enabled: bool,
    pub properties: PropertyRegistry,
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any part of the input panel should be shown.
    pub fn is_visible(&self) -> bool {
        self.show_preedit || self.show_aux || self.show_lookup_table
    }

    /// Replaces the spot rectangle. Returns `false` when all six fields are
    /// bitwise-equal to the current ones.
    pub fn set_spot(&mut self, x: i32, y: i32, w: i32, h: i32, relative: bool, scale: f64) -> bool {
        let spot = Spot {
            x,
            y,
            w,
            h,
            relative,
            scale,
        };
        if self.spot.same_as(&spot) {
            return false;
        }
        self.spot = spot;
        true
    }

    /// Moves the spot to a point, keeping its relative mode and scale.
    pub fn set_spot_location(&mut self, x: i32, y: i32) -> bool {
        let Spot { relative, scale, .. } = self.spot;
        self.set_spot(x, y, 0, 0, relative, scale)
    }

    pub fn set_preedit_text(&mut self, text: &str) -> bool {
        if self.preedit.text == text {
            return false;
        }
        self.preedit.text = text.to_owned();
        true
    }

    pub fn set_preedit_caret(&mut self, caret: i32) -> bool {
        replace(&mut self.preedit.caret, caret)
    }

    pub fn set_aux(&mut self, text: &str) -> bool {
        if self.aux == text {
            return false;
        }
        self.aux = text.to_owned();
        true
    }

    /// Moves the lookup table highlight.
    pub fn set_cursor(&mut self, cursor: i32) -> bool {
        replace(&mut self.lookup_table.cursor, cursor)
    }

    pub fn set_show_preedit(&mut self, show: bool) -> bool {
        replace(&mut self.show_preedit, show)
    }

    pub fn set_show_aux(&mut self, show: bool) -> bool {
        replace(&mut self.show_aux, show)
    }

    pub fn set_show_lookup_table(&mut self, show: bool) -> bool {
        replace(&mut self.show_lookup_table, show)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        replace(&mut self.enabled, enabled)
    }

    /// Replaces the lookup table.
    ///
    /// Returns `true` when the page is the clear idiom, in which case the
    /// caller resets its suggestion session.
    pub fn set_lookup_table(&mut self, page: LookupTablePage) -> bool {
        self.lookup_table = LookupTable::from(page);
        self.lookup_table.is_clear()
    }

    pub fn clear_lookup_table(&mut self) {
        self.lookup_table = LookupTable::default();
    }

    /// Restores everything except the property registry.
    pub fn reset(&mut self) {
        let properties = std::mem::take(&mut self.properties);
        *self = Self {
            properties,
            ..Self::default()
        };
    }
}

// ============================================================================
// Tests
// ============================================================================
