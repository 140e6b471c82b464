// SPDX-License-Identifier: GPL-3.0-only

//! Property registry and indicator icon selection.
//!
//! The registry keeps input-method properties in registration order and
//! reports what a `RegisterProperties` batch added, updated or removed so an
//! indicator can patch its menu instead of rebuilding it.

use crate::app_settings::{DEFAULT_INDICATOR_ICON, IM_PROPERTY_KEY};
use crate::protocol::{extract_label, Property};

/// `/Fcitx/im` states whose keyboard should latch into kana input.
///
/// Each entry is `(label, icon, text)`.
const KANA_INPUT_METHODS: &[(&str, &str, &str)] = &[
    ("Anthy", "fcitx-anthy", "ひらがな"),
    ("Mozc", "fcitx-mozc", "全角かな"),
    ("Mozc", "fcitx_mozc_hiragana", "全角かな"),
    ("SKK", "fcitx_skk", "ひらがな"),
    ("かな漢字", "fcitx_kkc", "ひらがな"),
];

/// What the indicator should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorIcon {
    /// A named or absolute-path icon.
    Icon(String),
    /// A short text label in place of an icon.
    Label(String),
}

impl IndicatorIcon {
    /// The icon shown while no input method is active.
    pub fn inactive() -> Self {
        IndicatorIcon::Icon(DEFAULT_INDICATOR_ICON.to_string())
    }

    /// Picks the icon for a property: a `label=` hint wins, then the icon
    /// name, then the shortened label.
    pub fn for_property(property: &Property) -> Self {
        if let Some(label) = property.label_hint() {
            return IndicatorIcon::Label(extract_label(label));
        }
        if property.icon.is_empty() {
            IndicatorIcon::Label(extract_label(&property.label))
        } else {
            IndicatorIcon::Icon(property.icon.clone())
        }
    }
}

/// Keys touched by a registry update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl PropertyDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Input-method properties in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyRegistry {
    entries: Vec<Property>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.entries.iter().find(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Property] {
        &self.entries
    }

    /// Replaces the whole set.
    ///
    /// Keys absent from `properties` are removed, known keys keep their
    /// position, new keys are appended. A duplicated key keeps its last value.
    pub fn replace_all(&mut self, properties: Vec<Property>) -> PropertyDiff {
        let mut diff = PropertyDiff::default();

        self.entries.retain(|existing| {
            let keep = properties.iter().any(|p| p.key == existing.key);
            if !keep {
                diff.removed.push(existing.key.clone());
            }
            keep
        });

        for property in properties {
            let key = property.key.clone();
            match self.upsert(property) {
                Upsert::Added => diff.added.push(key),
                Upsert::Changed => {
                    if !diff.added.contains(&key) && !diff.updated.contains(&key) {
                        diff.updated.push(key);
                    }
                }
                Upsert::Unchanged => {}
            }
        }

        diff
    }

    /// Inserts or replaces a single property. Returns `true` if anything changed.
    pub fn update(&mut self, property: Property) -> bool {
        !matches!(self.upsert(property), Upsert::Unchanged)
    }

    pub fn clear(&mut self) -> PropertyDiff {
        PropertyDiff {
            removed: self.entries.drain(..).map(|p| p.key).collect(),
            ..PropertyDiff::default()
        }
    }

    /// Icon for the indicator given the input method's enabled flag.
    pub fn indicator_icon(&self, enabled: bool) -> IndicatorIcon {
        match self.get(IM_PROPERTY_KEY) {
            Some(property) if enabled => IndicatorIcon::for_property(property),
            _ => IndicatorIcon::inactive(),
        }
    }

    fn upsert(&mut self, property: Property) -> Upsert {
        match self.entries.iter_mut().find(|p| p.key == property.key) {
            Some(existing) if *existing == property => Upsert::Unchanged,
            Some(existing) => {
                *existing = property;
                Upsert::Changed
            }
            None => {
                self.entries.push(property);
                Upsert::Added
            }
        }
    }
}

enum Upsert {
    Added,
    Changed,
    Unchanged,
}

/// Whether a property reports a Japanese input method in hiragana mode.
pub fn is_kana_active(property: &Property) -> bool {
    property.key == IM_PROPERTY_KEY
        && KANA_INPUT_METHODS.iter().any(|(label, icon, text)| {
            property.label == *label && property.icon == *icon && property.text == *text
        })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(raw: &str) -> Property {
        Property::parse(raw).unwrap()
    }

    /// Test: Replacing the set reports added, updated and removed keys.
    #[test]
    fn test_replace_all_diff() {
        let mut registry = PropertyRegistry::new();
        let diff = registry.replace_all(vec![prop("a:A:ia:ta"), prop("b:B:ib:tb")]);
        assert_eq!(diff.added, vec!["a", "b"]);
        assert!(diff.updated.is_empty());

        let diff = registry.replace_all(vec![prop("b:B2:ib:tb"), prop("c:C:ic:tc")]);
        assert_eq!(diff.added, vec!["c"]);
        assert_eq!(diff.updated, vec!["b"]);
        assert_eq!(diff.removed, vec!["a"]);

        let keys: Vec<&str> = registry.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c"], "Order follows registration");
    }

    /// Test: Re-registering identical properties is an empty diff.
    #[test]
    fn test_replace_all_unchanged() {
        let mut registry = PropertyRegistry::new();
        registry.replace_all(vec![prop("a:A:ia:ta")]);
        assert!(registry.replace_all(vec![prop("a:A:ia:ta")]).is_empty());
    }

    /// Test: Single updates insert or replace.
    #[test]
    fn test_update() {
        let mut registry = PropertyRegistry::new();
        assert!(registry.update(prop("a:A:ia:ta")));
        assert!(!registry.update(prop("a:A:ia:ta")));
        assert!(registry.update(prop("a:A2:ia:ta")));
        assert_eq!(registry.get("a").unwrap().label, "A2");
        assert_eq!(registry.len(), 1);
    }

    /// Test: Clearing reports every key as removed.
    #[test]
    fn test_clear() {
        let mut registry = PropertyRegistry::new();
        registry.replace_all(vec![prop("a:A:ia:ta"), prop("b:B:ib:tb")]);

        let diff = registry.clear();
        assert_eq!(diff.removed, vec!["a", "b"]);
        assert!(registry.is_empty());
    }

    /// Test: Indicator icon follows the input-method property when enabled.
    #[test]
    fn test_indicator_icon() {
        let mut registry = PropertyRegistry::new();
        assert_eq!(registry.indicator_icon(true), IndicatorIcon::inactive());

        registry.update(prop("/Fcitx/im:Pinyin:fcitx-pinyin:拼"));
        assert_eq!(
            registry.indicator_icon(true),
            IndicatorIcon::Icon("fcitx-pinyin".to_string())
        );
        assert_eq!(registry.indicator_icon(false), IndicatorIcon::inactive());
    }

    /// Test: Label hints and empty icons produce text labels.
    #[test]
    fn test_icon_for_property() {
        assert_eq!(
            IndicatorIcon::for_property(&prop("k:Mozc:fcitx-mozc:あ:label=あ")),
            IndicatorIcon::Label("あ".to_string())
        );
        assert_eq!(
            IndicatorIcon::for_property(&prop("k:English::En")),
            IndicatorIcon::Label("En".to_string())
        );
    }

    /// Test: Kana detection matches the supported Japanese input methods only.
    #[test]
    fn test_is_kana_active() {
        assert!(is_kana_active(&prop("/Fcitx/im:Mozc:fcitx-mozc:全角かな")));
        assert!(is_kana_active(&prop("/Fcitx/im:Anthy:fcitx-anthy:ひらがな:label=あ")));
        assert!(!is_kana_active(&prop("/Fcitx/im:Mozc:fcitx-mozc:直接入力")));
        assert!(!is_kana_active(&prop("/Fcitx/other:Mozc:fcitx-mozc:全角かな")));
    }
}
