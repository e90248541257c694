//! TOML configuration file support.
//!
//! ```toml
//! # rusty-plankton.toml
//! [data]
//! root = "../data/export/"
//!
//! [publish]
//! topic = "visualization/dataset"
//! ```
//!
//! Every key is optional; missing keys keep their defaults and command-line
//! flags override whatever the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_DATA_ROOT: &str = "../data/export/";
pub const DEFAULT_TOPIC: &str = "visualization/dataset";

/// Root configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

/// Where the per-sample exports live.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

/// Channel the selected sample is announced on.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_ROOT)
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, root: Option<PathBuf>, topic: Option<String>) -> Self {
        if let Some(root) = root {
            self.data.root = root;
        }
        if let Some(topic) = topic {
            self.publish.topic = topic;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [data]
            root = "/srv/exports"

            [publish]
            topic = "lab/selection"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.data.root, PathBuf::from("/srv/exports"));
        assert_eq!(config.publish.topic, "lab/selection");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_str("[publish]\ntopic = \"t\"\n").unwrap();
        assert_eq!(config.data.root, PathBuf::from(DEFAULT_DATA_ROOT));
        assert_eq!(config.publish.topic, "t");
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.data.root, PathBuf::from(DEFAULT_DATA_ROOT));
        assert_eq!(config.publish.topic, DEFAULT_TOPIC);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::default().with_overrides(Some(PathBuf::from("/tmp/x")), None);
        assert_eq!(config.data.root, PathBuf::from("/tmp/x"));
        assert_eq!(config.publish.topic, DEFAULT_TOPIC);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(Config::from_str("[data]\nroot = 5\n").is_err());
    }
}
