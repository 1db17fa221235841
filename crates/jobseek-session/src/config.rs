//! Configuration management for the Jobseek client.
//!
//! Loads configuration from ${JOBSEEK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for Jobseek configuration and data directories.
    //!
    //! JOBSEEK_HOME resolution order:
    //! 1. JOBSEEK_HOME environment variable (if set)
    //! 2. ~/.config/jobseek (default)
    //! 3. ./.jobseek when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the Jobseek home directory.
    pub fn jobseek_home() -> PathBuf {
        if let Ok(home) = std::env::var("JOBSEEK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".jobseek"),
            |h| h.join(".config").join("jobseek"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        jobseek_home().join("config.toml")
    }
}

/// Upload service configuration (Cloudinary-style unsigned uploads).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Upload endpoint URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unsigned upload preset
    pub preset: String,
    /// Folder prefix; files land in `<folder>/avatar` or `<folder>/cv`
    pub folder: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: None,
            preset: UploadConfig::DEFAULT_PRESET.to_string(),
            folder: UploadConfig::DEFAULT_FOLDER.to_string(),
        }
    }
}

impl UploadConfig {
    const DEFAULT_PRESET: &str = "jobseek";
    const DEFAULT_FOLDER: &str = "jobseek";

    /// Returns the upload URL, preferring `JOBSEEK_UPLOAD_URL`.
    pub fn effective_url(&self) -> Option<String> {
        std::env::var("JOBSEEK_UPLOAD_URL")
            .ok()
            .or_else(|| self.url.clone())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Jobseek API (e.g. `https://jobseek.example/api`)
    pub api_base_url: String,

    /// Timeout for each API request in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// File upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Config::DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: Config::DEFAULT_REQUEST_TIMEOUT_SECS,
            upload: UploadConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes a default config file. Fails if one already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, Self::generate()?)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Renders the default config as TOML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn generate() -> Result<String> {
        let body =
            toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
        Ok(format!(
            "# Jobseek client configuration\n\
             # upload.url = \"https://api.cloudinary.com/v1_1/<cloud>/auto/upload\"\n\n{body}"
        ))
    }

    /// Returns the API base URL, preferring `JOBSEEK_API_BASE_URL`.
    pub fn effective_api_base_url(&self) -> String {
        std::env::var("JOBSEEK_API_BASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.api_base_url.clone())
    }

    /// Returns the request timeout, or None if disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.upload.url, None);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "api_base_url = \"https://jobs.example/api\"\n\n[upload]\npreset = \"custom\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api_base_url, "https://jobs.example/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.upload.preset, "custom");
        assert_eq!(config.upload.folder, "jobseek");
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("api_base_url"));
        let parsed = Config::load_from(&config_path).unwrap();
        assert_eq!(parsed.api_base_url, "http://localhost:5000/api");
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "# existing").unwrap();

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), None);
        assert_eq!(
            Config::default().request_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
