//! JSON configuration loading and validation.
//!
//! The configuration file is read once at startup and passed explicitly to
//! every component that needs it (the server keeps it behind an `Arc`).
//!
//! ```json
//! {
//!   "upload_folder": "uploads",
//!   "allowed_extensions": ["pdf"],
//!   "storage_folder": "storage",
//!   "server": { "bind": "127.0.0.1:5000" },
//!   "schedule": [
//!     { "email": "reader@example.com", "content": "Chapter 1", "at": "07:30" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scheduler::parse_time_of_day;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub upload_folder: PathBuf,
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_storage_folder")]
    pub storage_folder: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub schedule: Vec<DeliveryConfig>,
}

fn default_storage_folder() -> PathBuf {
    PathBuf::from("storage")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// A piece of content delivered to an address once a day.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub email: String,
    pub content: String,
    /// Wall-clock time of day, `HH:MM` or `HH:MM:SS`.
    pub at: String,
}

impl Config {
    /// Returns true if `ext` (without the dot) is in the allow-list.
    /// Comparison is case-insensitive.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config =
        serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(config)
}

/// Normalizes and checks a parsed configuration.
///
/// Extensions are lowercased and any leading dot is removed so that both
/// `"pdf"` and `".PDF"` are accepted in the file.
pub fn validate(mut config: Config) -> Result<Config> {
    config.allowed_extensions = config
        .allowed_extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    if config.allowed_extensions.is_empty() {
        anyhow::bail!("allowed_extensions must contain at least one extension");
    }

    if config.upload_folder.as_os_str().is_empty() {
        anyhow::bail!("upload_folder must not be empty");
    }

    if config.storage_folder.as_os_str().is_empty() {
        anyhow::bail!("storage_folder must not be empty");
    }

    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }

    for delivery in &config.schedule {
        parse_time_of_day(&delivery.at).with_context(|| {
            format!(
                "Invalid schedule time '{}' for {}",
                delivery.at, delivery.email
            )
        })?;
    }

    Ok(config)
}
