//! Configuration settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_lsp::lsp_types::FormattingOptions;
use xmlsense_core::FormattingSettings;
use xmlsense_dom::Dialect;

/// Name of the configuration file looked up in the workspace root
pub const CONFIG_FILE_NAME: &str = "xmlsense.toml";

/// Failure to load the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Formatter options
    pub format: FormattingSettings,
    /// File classification
    pub files: FileSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load `xmlsense.toml` from `root`
    ///
    /// A missing file yields the defaults.
    pub fn load_from_dir(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    /// Load a configuration file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply a `workspace/didChangeConfiguration` payload
    ///
    /// Only `xml.format` is read; it replaces the whole format section so
    /// omitted keys fall back to their defaults. Returns whether the payload
    /// carried a format section that parsed.
    pub fn apply_client_settings(&mut self, payload: &Value) -> bool {
        let Some(format) = payload.get("xml").and_then(|xml| xml.get("format")) else {
            return false;
        };
        match serde_json::from_value::<FormattingSettings>(format.clone()) {
            Ok(format) => {
                self.format = format;
                true
            }
            Err(_) => false,
        }
    }

    /// Dialect used to parse the document at `path`
    pub fn dialect_for(&self, path: &Path) -> Dialect {
        let is_dtd = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.files.is_dtd_extension(ext));
        if is_dtd {
            Dialect::Dtd
        } else {
            Dialect::Xml
        }
    }

    /// Format settings with the per-request editor options applied
    pub fn format_for_request(&self, options: &FormattingOptions) -> FormattingSettings {
        let mut format = self.format.clone();
        format.tab_size = options.tab_size as usize;
        format.insert_spaces = options.insert_spaces;
        if let Some(trim) = options.trim_trailing_whitespace {
            format.trim_trailing_whitespace = trim;
        }
        if let Some(insert) = options.insert_final_newline {
            format.insert_final_newline = insert;
        }
        if let Some(trim) = options.trim_final_newlines {
            format.trim_final_newlines = trim;
        }
        format
    }
}

/// File classification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSettings {
    /// Extensions parsed as standalone DTDs
    pub dtd_extensions: Vec<String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            dtd_extensions: vec!["dtd".to_string(), "ent".to_string(), "mod".to_string()],
        }
    }
}

impl FileSettings {
    pub fn is_dtd_extension(&self, extension: &str) -> bool {
        self.dtd_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_file_settings_default() {
        let files = FileSettings::default();
        assert!(files.is_dtd_extension("dtd"));
        assert!(files.is_dtd_extension("ENT"));
        assert!(!files.is_dtd_extension("xml"));
    }

    #[test]
    fn test_settings_debug() {
        let settings = Settings::default();
        let debug_str = format!("{:?}", settings);
        assert!(debug_str.contains("Settings"));
    }
}
