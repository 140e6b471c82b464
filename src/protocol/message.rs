// SPDX-License-Identifier: GPL-3.0-only

//! Typed kimpanel messages.
//!
//! Inbound signals arrive on `org.kde.kimpanel.inputmethod`, inbound method
//! calls on `org.kde.impanel2`, and outbound signals leave on
//! `org.kde.impanel` (plus `PanelCreated2` on `org.kde.impanel2`).

use crate::app_settings::{IMPANEL2_INTERFACE, IMPANEL_INTERFACE};
use std::fmt;

/// Candidate list orientation requested by the input method.
///
/// Wire values: `0` not set, `1` vertical, `2` horizontal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutHint {
    #[default]
    NotSet,
    Vertical,
    Horizontal,
}

impl From<i32> for LayoutHint {
    fn from(value: i32) -> Self {
        match value {
            1 => LayoutHint::Vertical,
            2 => LayoutHint::Horizontal,
            _ => LayoutHint::NotSet,
        }
    }
}

/// Signals emitted by the input method on `org.kde.kimpanel.inputmethod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundSignal {
    ExecMenu(Vec<String>),
    RegisterProperties(Vec<String>),
    UpdateProperty(String),
    UpdateSpotLocation { x: i32, y: i32 },
    UpdatePreeditText { text: String, attrs: String },
    UpdateAux { text: String, attrs: String },
    UpdateLookupTableCursor(i32),
    UpdatePreeditCaret(i32),
    ShowPreedit(bool),
    ShowLookupTable(bool),
    ShowAux(bool),
    Enable(bool),
}

impl InboundSignal {
    /// Decodes a signal message.
    ///
    /// Returns `Ok(None)` for members this panel does not handle.
    pub fn from_message(message: &zbus::Message) -> Result<Option<Self>, DecodeError> {
        let header = message.header();
        match header.member() {
            Some(member) => Self::decode(member.as_str(), &message.body()),
            None => Ok(None),
        }
    }

    /// Decodes a signal body given its member name.
    pub fn decode(member: &str, body: &zbus::message::Body) -> Result<Option<Self>, DecodeError> {
        let wrap = |source| DecodeError::new(member, source);

        let signal = match member {
            "ExecMenu" => Self::ExecMenu(body.deserialize::<Vec<String>>().map_err(wrap)?),
            "RegisterProperties" => {
                Self::RegisterProperties(body.deserialize::<Vec<String>>().map_err(wrap)?)
            }
            "UpdateProperty" => Self::UpdateProperty(body.deserialize::<String>().map_err(wrap)?),
            "UpdateSpotLocation" => {
                let (x, y) = body.deserialize::<(i32, i32)>().map_err(wrap)?;
                Self::UpdateSpotLocation { x, y }
            }
            "UpdatePreeditText" => {
                let (text, attrs) = body.deserialize::<(String, String)>().map_err(wrap)?;
                Self::UpdatePreeditText { text, attrs }
            }
            "UpdateAux" => {
                let (text, attrs) = body.deserialize::<(String, String)>().map_err(wrap)?;
                Self::UpdateAux { text, attrs }
            }
            "UpdateLookupTableCursor" => {
                Self::UpdateLookupTableCursor(body.deserialize::<i32>().map_err(wrap)?)
            }
            "UpdatePreeditCaret" => {
                Self::UpdatePreeditCaret(body.deserialize::<i32>().map_err(wrap)?)
            }
            "ShowPreedit" => Self::ShowPreedit(body.deserialize::<bool>().map_err(wrap)?),
            "ShowLookupTable" => Self::ShowLookupTable(body.deserialize::<bool>().map_err(wrap)?),
            "ShowAux" => Self::ShowAux(body.deserialize::<bool>().map_err(wrap)?),
            "Enable" => Self::Enable(body.deserialize::<bool>().map_err(wrap)?),
            _ => return Ok(None),
        };

        Ok(Some(signal))
    }
}

/// One page of the input method's lookup table, as sent by `SetLookupTable`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTablePage {
    pub labels: Vec<String>,
    pub texts: Vec<String>,
    pub attrs: Vec<String>,
    pub has_prev: bool,
    pub has_next: bool,
    pub cursor: i32,
    pub layout: i32,
}

/// Method calls received on `org.kde.impanel2`.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCall {
    SetSpotRect { x: i32, y: i32, w: i32, h: i32 },
    SetRelativeSpotRect { x: i32, y: i32, w: i32, h: i32 },
    SetRelativeSpotRectV2 { x: i32, y: i32, w: i32, h: i32, scale: f64 },
    SetLookupTable(LookupTablePage),
}

/// Signals the panel emits towards the input method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    MovePreeditCaret(i32),
    SelectCandidate(i32),
    LookupTablePageUp,
    LookupTablePageDown,
    TriggerProperty(String),
    PanelCreated,
    Exit,
    ReloadConfig,
    Configure,
    PanelCreated2,
}

impl OutboundSignal {
    /// Interface the signal is emitted on.
    pub fn interface(&self) -> &'static str {
        match self {
            OutboundSignal::PanelCreated2 => IMPANEL2_INTERFACE,
            _ => IMPANEL_INTERFACE,
        }
    }

    /// Member name on the wire.
    pub fn member(&self) -> &'static str {
        match self {
            OutboundSignal::MovePreeditCaret(_) => "MovePreeditCaret",
            OutboundSignal::SelectCandidate(_) => "SelectCandidate",
            OutboundSignal::LookupTablePageUp => "LookupTablePageUp",
            OutboundSignal::LookupTablePageDown => "LookupTablePageDown",
            OutboundSignal::TriggerProperty(_) => "TriggerProperty",
            OutboundSignal::PanelCreated => "PanelCreated",
            OutboundSignal::Exit => "Exit",
            OutboundSignal::ReloadConfig => "ReloadConfig",
            OutboundSignal::Configure => "Configure",
            OutboundSignal::PanelCreated2 => "PanelCreated2",
        }
    }
}

/// A signal body that did not match the expected argument types.
#[derive(Debug)]
pub struct DecodeError {
    /// Member name of the offending signal.
    pub member: String,
    /// The underlying deserialization error.
    pub source: zbus::Error,
}

impl DecodeError {
    pub fn new(member: impl Into<String>, source: zbus::Error) -> Self {
        Self {
            member: member.into(),
            source,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed {} payload: {}", self.member, self.source)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_settings::INPUTMETHOD_INTERFACE;

    fn signal<B>(member: &str, body: &B) -> zbus::Message
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        zbus::Message::signal("/kimpanel", INPUTMETHOD_INTERFACE, member)
            .unwrap()
            .build(body)
            .unwrap()
    }

    /// Test: Layout hints follow the Fcitx wire values.
    #[test]
    fn test_layout_hint_from_wire() {
        assert_eq!(LayoutHint::from(0), LayoutHint::NotSet);
        assert_eq!(LayoutHint::from(1), LayoutHint::Vertical);
        assert_eq!(LayoutHint::from(2), LayoutHint::Horizontal);
        assert_eq!(LayoutHint::from(7), LayoutHint::NotSet);
    }

    /// Test: Two-argument signals decode into their typed fields.
    #[test]
    fn test_decode_spot_location_and_preedit() {
        let message = signal("UpdateSpotLocation", &(10i32, 20i32));
        assert_eq!(
            InboundSignal::from_message(&message).unwrap(),
            Some(InboundSignal::UpdateSpotLocation { x: 10, y: 20 })
        );

        let message = signal("UpdatePreeditText", &("nihao", ""));
        assert_eq!(
            InboundSignal::from_message(&message).unwrap(),
            Some(InboundSignal::UpdatePreeditText {
                text: "nihao".to_string(),
                attrs: String::new(),
            })
        );
    }

    /// Test: Array and scalar payloads decode.
    #[test]
    fn test_decode_array_and_scalar_payloads() {
        let keys = vec!["a:A:ia:ta".to_string()];
        let message = signal("RegisterProperties", &keys);
        assert_eq!(
            InboundSignal::from_message(&message).unwrap(),
            Some(InboundSignal::RegisterProperties(keys))
        );

        let message = signal("Enable", &true);
        assert_eq!(
            InboundSignal::from_message(&message).unwrap(),
            Some(InboundSignal::Enable(true))
        );
    }

    /// Test: Unknown members are skipped without error.
    #[test]
    fn test_decode_unknown_member() {
        let message = signal("SomethingElse", &1i32);
        assert_eq!(InboundSignal::from_message(&message).unwrap(), None);
    }

    /// Test: A payload with the wrong shape is reported, not panicked on.
    #[test]
    fn test_decode_wrong_shape() {
        let message = signal("ShowAux", &"yes");
        let err = InboundSignal::from_message(&message).unwrap_err();
        assert_eq!(err.member, "ShowAux");
        assert!(err.to_string().contains("malformed ShowAux payload"));
    }

    /// Test: Outbound signals map to the right interface and member.
    #[test]
    fn test_outbound_names() {
        assert_eq!(OutboundSignal::SelectCandidate(2).member(), "SelectCandidate");
        assert_eq!(OutboundSignal::SelectCandidate(2).interface(), IMPANEL_INTERFACE);
        assert_eq!(OutboundSignal::LookupTablePageDown.member(), "LookupTablePageDown");
        assert_eq!(OutboundSignal::PanelCreated2.interface(), IMPANEL2_INTERFACE);
    }
}
