//! API key precedence between the operator's own key and the backend key

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the backend (server-configured) key
pub const BACKEND_KEY_ENV: &str = "VETRO_API_KEY";

/// Which key wins when both are available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPreference {
    /// Use the operator's key when one is set, else fall back to the backend key
    #[default]
    UserKeyIfSet,
    /// Always use the backend key
    AlwaysBackend,
}

impl std::fmt::Display for KeyPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPreference::UserKeyIfSet => write!(f, "Use user key (if set)"),
            KeyPreference::AlwaysBackend => write!(f, "Always use backend key"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    User,
    Backend,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::User => write!(f, "user key"),
            KeySource::Backend => write!(f, "backend key"),
        }
    }
}

/// The key a transport should authenticate with
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    pub source: KeySource,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("key", &mask_key(&self.key))
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no API key available: run `vetro-cli config set-key` or set VETRO_API_KEY")]
    NoKey,
    #[error("key preference is 'always backend' but VETRO_API_KEY is not set")]
    BackendKeyMissing,
}

/// Read the backend key from the environment (after `.env` has been loaded)
pub fn backend_key_from_env() -> Option<String> {
    std::env::var(BACKEND_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Pick the effective key according to the preference
pub fn resolve_api_key(
    user_key: Option<&str>,
    backend_key: Option<&str>,
    preference: KeyPreference,
) -> Result<ResolvedKey, CredentialError> {
    let user_key = user_key.map(str::trim).filter(|k| !k.is_empty());
    let backend_key = backend_key.map(str::trim).filter(|k| !k.is_empty());

    let resolved = match preference {
        KeyPreference::AlwaysBackend => backend_key
            .map(|key| (key, KeySource::Backend))
            .ok_or(CredentialError::BackendKeyMissing)?,
        KeyPreference::UserKeyIfSet => user_key
            .map(|key| (key, KeySource::User))
            .or_else(|| backend_key.map(|key| (key, KeySource::Backend)))
            .ok_or(CredentialError::NoKey)?,
    };

    Ok(ResolvedKey {
        key: resolved.0.to_string(),
        source: resolved.1,
    })
}

/// Show only the edges of a key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
