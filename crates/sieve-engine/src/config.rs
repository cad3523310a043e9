//! Engine configuration
//!
//! Read once at startup from a JSON file. Missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Configuration for the filter engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch for blocking and cosmetic filtering
    pub enabled: bool,
    /// EasyList-style filter list
    pub filter_list: PathBuf,
    /// Root for generated stylesheets; a per-process directory is created below it
    pub cache_dir: PathBuf,
    /// User stylesheet merged into every generated stylesheet
    pub user_stylesheet_uri: Option<String>,
    /// Full public suffix list; the embedded subset is used when unset
    pub public_suffix_list: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            filter_list: PathBuf::from("adblock/filterlist.txt"),
            cache_dir: std::env::temp_dir().join("adsieve"),
            user_stylesheet_uri: None,
            public_suffix_list: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the file cannot be read, parsed or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;

        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("Failed to parse JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// A configuration for a given filter list, everything else default.
    pub fn with_filter_list(path: impl Into<PathBuf>) -> Self {
        Self {
            filter_list: path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.filter_list.as_os_str().is_empty() {
            return Err(EngineError::Config("filter_list must not be empty".to_string()));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(EngineError::Config("cache_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = Config::from_json(r#"{"filter_list": "/etc/adsieve/easylist.txt"}"#)
            .expect("config should parse");
        assert!(config.enabled);
        assert_eq!(config.filter_list, PathBuf::from("/etc/adsieve/easylist.txt"));
        assert_eq!(config.user_stylesheet_uri, None);
        assert_eq!(config.cache_dir, Config::default().cache_dir);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"enabled": false, "filter_list": "list.txt", "user_stylesheet_uri": "file:///tmp/user.css"}}"#
        )
        .expect("write config");

        let config = Config::load(file.path()).expect("config should load");
        assert!(!config.enabled);
        assert_eq!(config.user_stylesheet_uri.as_deref(), Some("file:///tmp/user.css"));
    }

    #[test]
    fn rejects_empty_filter_list() {
        let result = Config::from_json(r#"{"filter_list": ""}"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Config::from_json("{"), Err(EngineError::Config(_))));
    }
}
