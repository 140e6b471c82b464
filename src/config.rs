// SPDX-License-Identifier: GPL-3.0-only

//! User configuration.
//!
//! Stored as JSON under the user config directory. Every field is optional
//! in the file; missing fields take their defaults, and a missing file is the
//! default configuration.

use crate::app_settings::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_FONT, DEFAULT_MAX_SEARCH_PAGES,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Panel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Lay candidates out vertically when the input method has no preference.
    pub vertical: bool,
    /// Font description, e.g. `"Sans Bold 11"`.
    pub font: String,
    /// Pages visited before a candidate search by text gives up.
    pub max_search_pages: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            vertical: false,
            font: DEFAULT_FONT.to_string(),
            max_search_pages: DEFAULT_MAX_SEARCH_PAGES,
        }
    }
}

impl PanelConfig {
    /// Default location: `$XDG_CONFIG_HOME/kimpanel/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads and validates a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io { source: e, path: path.to_path_buf() }),
        };

        Self::from_json(&json).map_err(|e| e.with_path(path))
    }

    /// Parses and validates configuration JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json {
            source: e,
            path: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font.trim().is_empty() {
            return Err(ConfigError::Invalid("font must not be empty".into()));
        }
        if self.max_search_pages == 0 {
            return Err(ConfigError::Invalid(
                "max_search_pages must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Renders the font as an inline style string for the input panel.
    pub fn text_style(&self) -> String {
        FontStyle::parse(&self.font).to_string()
    }
}

/// The parts of a font description the panel styles with.
#[derive(Debug, Clone, PartialEq)]
struct FontStyle {
    family: String,
    size: f64,
    style: &'static str,
    weight: u16,
}

impl FontStyle {
    /// Parses `"[FAMILY] [STYLE-WORDS] [SIZE]"`, e.g. `"Noto Sans CJK SC Bold 12"`.
    fn parse(description: &str) -> Self {
        let mut words: Vec<&str> = description.split_whitespace().collect();
        let mut font = Self {
            family: String::new(),
            size: 11.0,
            style: "normal",
            weight: 400,
        };

        if let Some(size) = words.last().and_then(|w| w.parse::<f64>().ok()) {
            font.size = size;
            words.pop();
        }

        while let Some(word) = words.last() {
            match word.to_ascii_lowercase().as_str() {
                "italic" => font.style = "italic",
                "oblique" => font.style = "oblique",
                "thin" => font.weight = 100,
                "light" => font.weight = 300,
                "medium" => font.weight = 500,
                "semibold" => font.weight = 600,
                "bold" => font.weight = 700,
                "heavy" => font.weight = 900,
                "regular" | "normal" | "roman" => {}
                _ => break,
            }
            words.pop();
        }

        font.family = if words.is_empty() {
            "Sans".to_string()
        } else {
            words.join(" ")
        };
        font
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "font-family:'{}';font-size:{}pt;font-style:{};font-weight:{}",
            self.family, self.size, self.style, self.weight
        )
    }
}

/// Errors loading or saving the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read or written.
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    /// The file is not valid configuration JSON.
    Json {
        source: serde_json::Error,
        path: Option<PathBuf>,
    },
    /// A value is out of range.
    Invalid(String),
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Json { source, path: None } => ConfigError::Json {
                source,
                path: Some(path.to_path_buf()),
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { source, path } => {
                write!(f, "I/O error on config '{}': {}", path.display(), source)
            }
            ConfigError::Json { source, path } => {
                write!(f, "Invalid config JSON")?;
                if let Some(path) = path {
                    write!(f, " in '{}'", path.display())?;
                }
                write!(f, " at line {}: {}", source.line(), source)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Test: Missing fields take their defaults.
    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PanelConfig::from_json(r#"{ "vertical": true }"#).unwrap();
        assert!(config.vertical);
        assert_eq!(config.font, DEFAULT_FONT);
        assert_eq!(config.max_search_pages, DEFAULT_MAX_SEARCH_PAGES);
    }

    /// Test: Validation rejects an empty font and a zero page cap.
    #[test]
    fn test_validation() {
        let err = PanelConfig::from_json(r#"{ "font": "  " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PanelConfig::from_json(r#"{ "max_search_pages": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("max_search_pages"));
    }

    /// Test: Malformed JSON reports the file path.
    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = PanelConfig::load(file.path()).unwrap_err();
        match &err {
            ConfigError::Json { path, .. } => assert!(path.is_some(), "Error should carry path"),
            other => panic!("Expected Json error, got {:?}", other),
        }
    }

    /// Test: A missing file yields the default configuration.
    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PanelConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    /// Test: A full configuration file loads every field.
    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "vertical": true, "font": "Noto Sans CJK SC 14", "max_search_pages": 10 }"#,
        )
        .unwrap();

        let config = PanelConfig::load(&path).unwrap();
        assert_eq!(
            config,
            PanelConfig {
                vertical: true,
                font: "Noto Sans CJK SC 14".to_string(),
                max_search_pages: 10,
            }
        );
    }

    /// Test: Font descriptions render as style strings.
    #[test]
    fn test_text_style() {
        let config = PanelConfig::default();
        assert_eq!(
            config.text_style(),
            "font-family:'Sans';font-size:11pt;font-style:normal;font-weight:400"
        );

        let config = PanelConfig {
            font: "Noto Sans CJK SC Bold Italic 12.5".to_string(),
            ..PanelConfig::default()
        };
        assert_eq!(
            config.text_style(),
            "font-family:'Noto Sans CJK SC';font-size:12.5pt;font-style:italic;font-weight:700"
        );
    }
}
