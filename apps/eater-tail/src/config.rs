//! Service configuration.
//!
//! Configuration is stored as TOML. The path comes from the first command
//! line argument, falling back to:
//! - Linux: `~/.config/eater/tail.toml`
//! - Windows: `%APPDATA%/eater/tail.toml`

use std::path::{Path, PathBuf};

use eater_endpoint::EndpointConfig;
use serde::{Deserialize, Serialize};

/// How event payloads are decoded before logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Opaque bytes; only the length and a lossy text preview are logged.
    #[default]
    Raw,
    /// Each payload is a JSON document.
    Json,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to accept producers on (`host:port`).
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub format: PayloadFormat,

    /// Longest payload preview written to the log, in bytes.
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,

    #[serde(default)]
    pub endpoint: EndpointConfig,
}

fn default_listen() -> String {
    "127.0.0.1:8040".into()
}

fn default_preview_len() -> usize {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            format: PayloadFormat::default(),
            preview_len: default_preview_len(),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the platform default), writing a
    /// default file if none exists yet.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p,
            None => config_path(),
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration read");
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("eater").join("tail.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("eater")
            .join("tail.toml")
    }
}
