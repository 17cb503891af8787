use crate::error::{QdataError, Result};
use crate::utils::fs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATA_URL: &str = "https://github.com/SunsetWolf/qlib_dataset/releases/download";
pub const DEFAULT_BIN_URL: &str = "https://github.com/chenditc/investment_data/releases";
pub const DEFAULT_TARGET_DIR: &str = "~/.qlib/qlib_data/cn_data";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL for versioned zip data archives.
    pub data_url: String,
    /// Base URL for dated tar.gz release archives.
    pub bin_url: String,
    pub timeout_secs: u64,
    pub chunk_size: usize,
    pub default_target_dir: PathBuf,
    /// Remove the downloaded archive once it has been extracted.
    pub delete_archive: bool,
    /// Overrides the version data archive versions are derived from.
    /// Unset means the running binary's version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_url: DEFAULT_DATA_URL.to_string(),
            bin_url: DEFAULT_BIN_URL.to_string(),
            timeout_secs: 60,
            chunk_size: 1024,
            default_target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            delete_archive: false,
            tool_version: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::ensure_dir_exists(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn tool_version(&self) -> &str {
        self.tool_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    /// Apply `QDATA_DATA_URL` / `QDATA_BIN_URL` mirrors.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("QDATA_DATA_URL") {
            self.data_url = url;
        }
        if let Ok(url) = std::env::var("QDATA_BIN_URL") {
            self.bin_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(QdataError::config_error("chunk_size must be greater than zero"));
        }
        if self.timeout_secs == 0 {
            return Err(QdataError::config_error("timeout_secs must be greater than zero"));
        }
        for url in [&self.data_url, &self.bin_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(QdataError::config_error(format!(
                    "base URL must be http(s): '{url}'"
                )));
            }
        }
        Ok(())
    }
}

fn get_qdata_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".qdata"))
        .ok_or(QdataError::HomeDirectoryNotFound)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_qdata_dir()?.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"delete_archive": true}"#).unwrap();
        assert!(config.delete_archive);
        assert_eq!(config.data_url, DEFAULT_DATA_URL);
        assert_eq!(config.default_target_dir, PathBuf::from(DEFAULT_TARGET_DIR));
    }

    #[test]
    fn test_saved_default_does_not_pin_tool_version() {
        let saved = serde_json::to_string_pretty(&Config::default()).unwrap();
        assert!(!saved.contains("tool_version"));

        let loaded: Config = serde_json::from_str(&saved).unwrap();
        assert_eq!(loaded.tool_version, None);
        assert_eq!(loaded.tool_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_explicit_tool_version_is_kept() {
        let loaded: Config = serde_json::from_str(r#"{"tool_version": "0.8.3"}"#).unwrap();
        assert_eq!(loaded.tool_version(), "0.8.3");

        let saved = serde_json::to_string(&loaded).unwrap();
        assert!(saved.contains(r#""tool_version":"0.8.3""#));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(QdataError::ConfigError { .. })));

        let config = Config {
            bin_url: "ftp://mirror.example".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
