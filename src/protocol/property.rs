// SPDX-License-Identifier: GPL-3.0-only

//! The colon-delimited property format used by `RegisterProperties`,
//! `UpdateProperty` and `ExecMenu`.
//!
//! A property string has the shape `key:label:icon:text[:hint1,hint2,...]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A status or toggle item exposed by the input method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub text: String,
    pub hint: Vec<String>,
}

impl Property {
    /// Parses a single property string.
    ///
    /// Returns `None` when fewer than four fields are present. Fields past the
    /// hint segment are ignored, and an empty hint segment yields no hints.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut fields = raw.split(':');
        let key = fields.next()?;
        let label = fields.next()?;
        let icon = fields.next()?;
        let text = fields.next()?;
        let hint = match fields.next() {
            Some(hints) if !hints.is_empty() => hints.split(',').map(str::to_owned).collect(),
            _ => Vec::new(),
        };

        Some(Self {
            key: key.to_owned(),
            label: label.to_owned(),
            icon: icon.to_owned(),
            text: text.to_owned(),
            hint,
        })
    }

    /// Parses a batch, dropping malformed entries.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        raw.iter()
            .filter_map(|entry| {
                let entry = entry.as_ref();
                let parsed = Self::parse(entry);
                if parsed.is_none() {
                    tracing::warn!("Dropping malformed property string: {:?}", entry);
                }
                parsed
            })
            .collect()
    }

    /// Returns the value of the first non-empty `label=` hint, if any.
    pub fn label_hint(&self) -> Option<&str> {
        self.hint
            .iter()
            .filter_map(|hint| hint.strip_prefix("label="))
            .find(|label| !label.is_empty())
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.key, self.label, self.icon, self.text)?;
        if !self.hint.is_empty() {
            write!(f, ":{}", self.hint.join(","))?;
        }
        Ok(())
    }
}

/// Shortens a label for display in a compact indicator.
///
/// Two characters are kept when both are ASCII, one otherwise.
pub fn extract_label(label: &str) -> String {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_ascii() && second.is_ascii() => {
            [first, second].iter().collect()
        }
        (Some(first), _) => first.to_string(),
        (None, _) => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: A property with hints parses every field in order.
    #[test]
    fn test_parse_with_hints() {
        let property = Property::parse("k1:Label:icon:text:h1,h2").unwrap();
        assert_eq!(property.key, "k1");
        assert_eq!(property.label, "Label");
        assert_eq!(property.icon, "icon");
        assert_eq!(property.text, "text");
        assert_eq!(property.hint, vec!["h1".to_string(), "h2".to_string()]);
    }

    /// Test: Missing and empty hint segments both yield no hints.
    #[test]
    fn test_parse_without_hints() {
        let property = Property::parse("k1:Label:icon:text").unwrap();
        assert!(property.hint.is_empty(), "Missing hint segment should be empty");

        let property = Property::parse("k1:Label:icon:text:").unwrap();
        assert!(property.hint.is_empty(), "Empty hint segment should be empty");
    }

    /// Test: Fewer than four fields is rejected.
    #[test]
    fn test_parse_rejects_short_strings() {
        assert!(Property::parse("").is_none());
        assert!(Property::parse("k1").is_none());
        assert!(Property::parse("k1:Label:icon").is_none());
    }

    /// Test: Empty fields are preserved rather than shifting later fields.
    #[test]
    fn test_parse_keeps_empty_fields() {
        let property = Property::parse("/Fcitx/im::fcitx-mozc:").unwrap();
        assert_eq!(property.key, "/Fcitx/im");
        assert_eq!(property.label, "");
        assert_eq!(property.icon, "fcitx-mozc");
        assert_eq!(property.text, "");
    }

    /// Test: A batch drops only the malformed entries.
    #[test]
    fn test_parse_all_skips_malformed_entries() {
        let raw = ["a:A:ia:ta", "broken", "b:B:ib:tb:label=B"];
        let parsed = Property::parse_all(&raw);

        assert_eq!(parsed.len(), 2, "Malformed entry should be discarded");
        assert_eq!(parsed[0].key, "a");
        assert_eq!(parsed[1].key, "b");
        assert_eq!(parsed[1].label_hint(), Some("B"));
    }

    /// Test: The label hint skips empty `label=` entries.
    #[test]
    fn test_label_hint() {
        let property = Property::parse("k:L:i:t:label=,foo,label=あ").unwrap();
        assert_eq!(property.label_hint(), Some("あ"));

        let property = Property::parse("k:L:i:t:foo").unwrap();
        assert_eq!(property.label_hint(), None);
    }

    /// Test: Display writes the wire format back out.
    #[test]
    fn test_display_matches_wire_format() {
        let raw = "k1:Label:icon:text:h1,h2";
        assert_eq!(Property::parse(raw).unwrap().to_string(), raw);
        let raw = "k1:Label:icon:text";
        assert_eq!(Property::parse(raw).unwrap().to_string(), raw);
    }

    /// Test: Label extraction keeps two ASCII characters or one otherwise.
    #[test]
    fn test_extract_label() {
        assert_eq!(extract_label("English"), "En");
        assert_eq!(extract_label("拼音"), "拼");
        assert_eq!(extract_label("A拼"), "A");
        assert_eq!(extract_label("x"), "x");
        assert_eq!(extract_label(""), "");
    }
}
