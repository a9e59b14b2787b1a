//! Config command handler

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::{KeyPreference, Settings, backend_key_from_env, mask_key};

pub fn handle_config_command(command: ConfigCommands, settings_path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Show => show(settings_path),
        ConfigCommands::SetKey { key } => {
            let key = match key {
                Some(key) => key,
                None => rpassword::prompt_password("Vetro API key: ").context("Failed to read API key")?,
            };
            set_key(settings_path, &key)?;
            println!("{}", "API key saved.".green());
            Ok(())
        }
        ConfigCommands::ClearKey => {
            if clear_key(settings_path)? {
                println!("{}", "API key removed.".green());
            } else {
                println!("No API key was stored.");
            }
            Ok(())
        }
        ConfigCommands::SetPreference { preference } => {
            let preference = KeyPreference::from(preference);
            set_preference(settings_path, preference)?;
            println!("Key preference set to: {}", preference.to_string().cyan());
            Ok(())
        }
    }
}

fn show(settings_path: &Path) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    let api = settings.api_config();

    println!("Settings file:    {}", settings_path.display().to_string().cyan());
    println!("API base URL:     {}", api.base_url);
    println!("Request timeout:  {}s", api.request_timeout.as_secs());
    println!(
        "User key:         {}",
        match settings.credentials.user_api_key.as_deref() {
            Some(key) => mask_key(key),
            None => "not set".dimmed().to_string(),
        }
    );
    println!(
        "Backend key:      {}",
        if backend_key_from_env().is_some() {
            "available".green()
        } else {
            "not set".dimmed()
        }
    );
    println!("Key preference:   {}", settings.credentials.key_preference);
    println!("Batch size:       {}", settings.batch_size());
    println!("Max retries:      {}", settings.submission.max_retries);
    println!("Initial backoff:  {}s", settings.submission.initial_backoff_secs);
    println!("Batch delay:      {}s", settings.submission.delay_between_batches_secs);

    Ok(())
}

/// Store the operator's key
pub fn set_key(settings_path: &Path, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    let mut settings = Settings::load(settings_path)?;
    settings.credentials.user_api_key = Some(key.to_string());
    settings.save(settings_path)
}

/// Remove the operator's key; returns whether one was stored
pub fn clear_key(settings_path: &Path) -> Result<bool> {
    let mut settings = Settings::load(settings_path)?;
    let had_key = settings.credentials.user_api_key.take().is_some();
    if had_key {
        settings.save(settings_path)?;
    }
    Ok(had_key)
}

pub fn set_preference(settings_path: &Path, preference: KeyPreference) -> Result<()> {
    let mut settings = Settings::load(settings_path)?;
    settings.credentials.key_preference = preference;
    settings.save(settings_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_key(&path, "  my-key-123  ").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.credentials.user_api_key.as_deref(), Some("my-key-123"));

        assert!(clear_key(&path).unwrap());
        assert_eq!(Settings::load(&path).unwrap().credentials.user_api_key, None);
        assert!(!clear_key(&path).unwrap());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(set_key(&path, "   ").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_preference_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_key(&path, "my-key").unwrap();
        set_preference(&path, KeyPreference::AlwaysBackend).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.credentials.key_preference, KeyPreference::AlwaysBackend);
        assert_eq!(settings.credentials.user_api_key.as_deref(), Some("my-key"));
    }
}
