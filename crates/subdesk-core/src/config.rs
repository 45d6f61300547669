//! Configuration module
//!
//! `Settings` is the operator's saved connection (API key and base URL),
//! persisted as JSON. `ClientConfig` layers environment variables over saved
//! settings over built-in defaults. `ProxyConfig` configures the forwarding
//! proxy from `SUBDESK_PROXY_*` variables.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.idiana.io";
pub const DEFAULT_WORKSPACE: &str = "marinestream";
pub const DEFAULT_ENVIRONMENT_ID: &str = "e9229623-b98c-5bef-8ee5-024f7e905a4c";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROXY_PORT: u16 = 3000;

/// Saved connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Settings {
    /// Location of the settings file: `$SUBDESK_SETTINGS`, else
    /// `<config dir>/subdesk/settings.json`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = env::var("SUBDESK_SETTINGS") {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("subdesk").join("settings.json"))
            .ok_or_else(|| {
                AppError::Config(
                    "Could not determine a config directory; set SUBDESK_SETTINGS".to_string(),
                )
            })
    }

    /// Load settings from `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read settings file {}", path.display()))
                    .into())
            }
        };

        serde_json::from_str(&raw)
            .with_context(|| format!("Settings file {} is not valid JSON", path.display()))
            .map_err(AppError::from)
    }

    /// Validate and persist settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "Please enter your API key".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }

        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;

        tracing::info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Settings with a new key and optional base URL, both trimmed.
    pub fn with_values(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: Some(api_key.trim().to_string()),
            base_url: base_url
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
        }
    }
}

/// Mask an API key for display, keeping the first and last four characters.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Effective configuration for talking to the vendor API.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub workspace: String,
    pub environment_id: Uuid,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            workspace: DEFAULT_WORKSPACE.to_string(),
            environment_id: Uuid::parse_str(DEFAULT_ENVIRONMENT_ID).unwrap_or_default(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Resolve configuration from the process environment and saved settings.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(settings, |key| env::var(key).ok())
    }

    /// Resolve configuration with an explicit variable lookup.
    pub fn resolve<F>(settings: &Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_key = var("SUBDESK_API_KEY").or_else(|| {
            settings
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        });

        let base_url = var("SUBDESK_BASE_URL")
            .or_else(|| settings.base_url.clone().filter(|u| !u.trim().is_empty()))
            .unwrap_or(defaults.base_url);

        let environment_id = match var("SUBDESK_ENVIRONMENT_ID") {
            Some(raw) => Uuid::parse_str(&raw).map_err(|_| {
                AppError::Config(format!("SUBDESK_ENVIRONMENT_ID '{}' is not a valid UUID", raw))
            })?,
            None => defaults.environment_id,
        };

        let timeout = match var("SUBDESK_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                AppError::Config("SUBDESK_TIMEOUT_SECS must be a valid number".to_string())
            })?),
            None => defaults.timeout,
        };

        Ok(Self {
            workspace: var("SUBDESK_WORKSPACE").unwrap_or(defaults.workspace),
            environment_id,
            api_key,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

fn default_proxy_port() -> u16 {
    DEFAULT_PROXY_PORT
}

fn default_proxy_target() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Raw `SUBDESK_PROXY_*` variables.
#[derive(Debug, Deserialize)]
struct ProxyEnv {
    #[serde(default = "default_proxy_port")]
    port: u16,
    #[serde(default = "default_proxy_target")]
    target: String,
    #[serde(default = "default_cors_origins")]
    cors_origins: String,
    #[serde(default = "default_environment")]
    environment: String,
}

/// Forwarding proxy configuration.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub port: u16,
    pub target: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let raw: ProxyEnv = envy::prefixed("SUBDESK_PROXY_")
            .from_env()
            .context("Invalid SUBDESK_PROXY_* configuration")?;
        Self::from_raw(raw)
    }

    /// Build from explicit key/value pairs (as if read from `SUBDESK_PROXY_*`).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: ProxyEnv = envy::from_iter(pairs).context("Invalid proxy configuration")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: ProxyEnv) -> Result<Self, anyhow::Error> {
        let cors_origins: Vec<String> = raw
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Self {
            port: raw.port,
            target: raw.target.trim().trim_end_matches('/').to_string(),
            cors_origins,
            environment: raw.environment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check if the proxy is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.allows_any_origin() {
            return Err(anyhow::anyhow!(
                "SUBDESK_PROXY_CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        if !self.target.starts_with("http://") && !self.target.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "SUBDESK_PROXY_TARGET must be an http(s) URL, got '{}'",
                self.target
            ));
        }
        if self.cors_origins.is_empty() {
            return Err(anyhow::anyhow!("SUBDESK_PROXY_CORS_ORIGINS must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_settings() {
        let config = ClientConfig::resolve(&Settings::default(), lookup(&[])).unwrap();
        assert_eq!(config.workspace, "marinestream");
        assert_eq!(config.base_url, "https://api.idiana.io");
        assert_eq!(config.environment_id.to_string(), DEFAULT_ENVIRONMENT_ID);
        assert_eq!(config.api_key, None);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn env_overrides_settings() {
        let settings = Settings::with_values("saved-key", Some("http://localhost:3000/"));
        let config = ClientConfig::resolve(
            &settings,
            lookup(&[("SUBDESK_API_KEY", "env-key"), ("SUBDESK_WORKSPACE", "fleet")]),
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.workspace, "fleet");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let settings = Settings::with_values("saved-key", None);
        let config =
            ClientConfig::resolve(&settings, lookup(&[("SUBDESK_API_KEY", "  ")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("saved-key"));
    }

    #[test]
    fn invalid_environment_id_is_config_error() {
        let err = ClientConfig::resolve(
            &Settings::default(),
            lookup(&[("SUBDESK_ENVIRONMENT_ID", "nope")]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        let settings = Settings::with_values(" key-123 ", Some(" "));
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("key-123"));
        assert_eq!(loaded.base_url, None);
    }

    #[test]
    fn saving_without_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let err = Settings::with_values("   ", None).save(&path).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Please enter your API key");
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn masks_keys() {
        assert_eq!(mask_api_key("abcdefghijkl"), "abcd…ijkl");
        assert_eq!(mask_api_key("short"), "*****");
    }

    #[test]
    fn proxy_config_defaults() {
        let config = ProxyConfig::from_pairs(Vec::new()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.target, "https://api.idiana.io");
        assert!(config.allows_any_origin());
        assert!(!config.is_production());
    }

    #[test]
    fn proxy_config_rejects_wildcard_in_production() {
        let err = ProxyConfig::from_pairs(vec![("environment".to_string(), "prod".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("cannot be '*'"));
    }

    #[test]
    fn proxy_config_parses_origins_and_port() {
        let config = ProxyConfig::from_pairs(vec![
            ("port".to_string(), "8080".to_string()),
            (
                "cors_origins".to_string(),
                "http://localhost:5173, https://ops.example.com".to_string(),
            ),
            ("target".to_string(), "https://api.rise-x.io/".to_string()),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.target, "https://api.rise-x.io");
    }
}
