use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    geolocation::Coordinates,
    model::{DEFAULT_FORECAST_DAYS, MAX_FORECAST_DAYS},
    provider::weatherapi::DEFAULT_BASE_URL,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHERAPI_KEY";
/// City searched when nothing better is known.
pub const DEFAULT_CITY: &str = "Prishtina";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Prizren"
/// forecast_days = 5
///
/// [location]
/// latitude = 42.66
/// longitude = 21.16
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the provider endpoint, mostly for testing.
    pub base_url: Option<String>,

    pub default_city: Option<String>,

    pub forecast_days: Option<u8>,

    /// Where favorites and history live. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,

    /// Position reported by the geolocation capability, if any.
    pub location: Option<Coordinates>,
}

impl Config {
    /// API key, with the environment taking precedence over the file.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env: Option<String>) -> Option<String> {
        env.filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn default_city(&self) -> &str {
        self.default_city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CITY)
    }

    /// Requested forecast length, clamped to the provider ceiling.
    pub fn forecast_days(&self) -> u8 {
        self.forecast_days.unwrap_or(DEFAULT_FORECAST_DAYS).min(MAX_FORECAST_DAYS)
    }

    /// Store an API key entered by the user.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding persisted favorites and history.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "moti", "moti")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
