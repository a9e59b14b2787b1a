//! Settings file management
//!
//! Settings live in `<config dir>/vetro-cli/config.toml`. A missing file means
//! defaults; unknown or missing keys fall back to defaults as well.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credentials::KeyPreference;

pub const DEFAULT_BASE_URL: &str = "https://api.vetro.io/v3";

/// Largest batch the CLI lets an operator choose
pub const MAX_BATCH_SIZE: usize = 50;

/// Environment override for the API base URL
const BASE_URL_ENV: &str = "VETRO_API_URL";

/// Runtime connection settings for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub credentials: CredentialSettings,
    pub submission: SubmissionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Operator's personal key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_api_key: Option<String>,
    pub key_preference: KeyPreference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    pub batch_size: usize,
    pub max_retries: u32,
    pub initial_backoff_secs: f64,
    pub delay_between_batches_secs: f64,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_retries: 5,
            initial_backoff_secs: 2.0,
            delay_between_batches_secs: 1.0,
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(dir.join("vetro-cli").join("config.toml"))
    }

    /// Load settings, returning defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        Ok(settings)
    }

    /// Write settings, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        // The file may hold an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
        }

        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Transport settings, with `VETRO_API_URL` taking precedence over the file
    pub fn api_config(&self) -> ApiConfig {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.api.base_url.clone());

        ApiConfig {
            base_url,
            request_timeout: Duration::from_secs(self.api.request_timeout_secs.max(1)),
        }
    }

    /// Configured batch size clamped to the supported range
    pub fn batch_size(&self) -> usize {
        self.submission.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}
