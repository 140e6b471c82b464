// SPDX-License-Identifier: GPL-3.0-only

//! Centralized bus names, object paths and defaults.

/// Well-known name owned by the panel.
pub const PANEL_BUS_NAME: &str = "org.kde.impanel";

/// Well-known name owned for the layout-group helper.
pub const HELPER_BUS_NAME: &str = "org.fcitx.GnomeHelper";

/// Object path carrying the `org.kde.impanel` and `org.kde.impanel2` interfaces.
pub const PANEL_PATH: &str = "/org/kde/impanel";

/// Object path carrying the `org.fcitx.GnomeHelper` interface.
pub const HELPER_PATH: &str = "/org/fcitx/GnomeHelper";

/// Panel → input method signals.
pub const IMPANEL_INTERFACE: &str = "org.kde.impanel";

/// Input method → panel methods.
pub const IMPANEL2_INTERFACE: &str = "org.kde.impanel2";

/// Input method → panel signals.
pub const INPUTMETHOD_INTERFACE: &str = "org.kde.kimpanel.inputmethod";

/// Fcitx controller, used to toggle the active input method.
pub const FCITX_BUS_NAME: &str = "org.fcitx.Fcitx5";
pub const FCITX_CONTROLLER_PATH: &str = "/controller";

/// Property key carrying the active input method.
pub const IM_PROPERTY_KEY: &str = "/Fcitx/im";

/// Icon shown while no input method is active.
pub const DEFAULT_INDICATOR_ICON: &str = "input-keyboard";

/// Font used when the configuration does not name one.
pub const DEFAULT_FONT: &str = "Sans 11";

/// Upper bound on pages visited while chasing a candidate by text.
pub const DEFAULT_MAX_SEARCH_PAGES: u32 = 64;

/// Capacity of the bus → panel event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Directory name under the user config dir.
pub const CONFIG_DIR_NAME: &str = "kimpanel";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.json";
