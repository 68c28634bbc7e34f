//! Configuration management for the bl4save CLI

use anyhow::{Context, Result};
use bl4save::ContainerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,
    pub strict_footer: bool,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("bl4save");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's configuration, or defaults if none was saved yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn get_steam_id(&self) -> Option<&str> {
        self.steam_id.as_deref()
    }

    /// Container options for this config; `strict` forces footer checks on
    pub fn container_options(&self, strict: bool) -> ContainerOptions {
        if strict || self.strict_footer {
            ContainerOptions::strict()
        } else {
            ContainerOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl4save::FooterCheck;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.get_steam_id().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            steam_id: Some("76561197960521364".to_string()),
            strict_footer: true,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "steam_id = \"123\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.get_steam_id(), Some("123"));
        assert!(!config.strict_footer);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "strict_footer = \"maybe\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_container_options() {
        let config = Config::default();
        assert_eq!(config.container_options(false).footer, FooterCheck::Permissive);
        assert_eq!(config.container_options(true).footer, FooterCheck::Strict);

        let strict = Config {
            strict_footer: true,
            ..Config::default()
        };
        assert_eq!(strict.container_options(false).footer, FooterCheck::Strict);
    }
}
