use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Language;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Upper bound on suggestion list length, whatever the configured limits.
pub const MAX_SUGGESTIONS: usize = 5;

/// Suggestion list timing and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub debounce_ms: u64,
    pub blur_grace_ms: u64,
    /// Remote lookups slower than this fall back to the built-in places.
    pub remote_timeout_ms: u64,
    pub remote_limit: usize,
    pub local_limit: usize,
    pub min_query_len: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            blur_grace_ms: 200,
            remote_timeout_ms: 3_000,
            remote_limit: 5,
            local_limit: 3,
            min_query_len: 2,
        }
    }
}

impl SuggestConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn remote_limit(&self) -> usize {
        self.remote_limit.min(MAX_SUGGESTIONS)
    }

    pub fn local_limit(&self) -> usize {
        self.local_limit.min(MAX_SUGGESTIONS)
    }
}

/// Call-volume counter backed by an Upstash Redis REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CounterConfig {
    pub enabled: bool,
    pub rest_url: Option<String>,
    pub rest_token: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// language = "es"
///
/// [suggest]
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub language: Language,
    pub timeout_secs: u64,
    pub suggest: SuggestConfig,
    pub counter: CounterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: Language::default(),
            timeout_secs: 10,
            suggest: SuggestConfig::default(),
            counter: CounterConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults on first run) and apply the process
    /// environment on top.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
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
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay environment variables: `API_KEY`, `WEATHER_BASE_URL`,
    /// `USE_UPSTASH`, `UPSTASH_REDIS_REST_URL`, `UPSTASH_REDIS_REST_TOKEN`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("WEATHER_BASE_URL") {
            self.base_url = url;
        }
        if let Some(flag) = non_empty("USE_UPSTASH") {
            self.counter.enabled = flag.trim() == "true";
        }
        if let Some(url) = non_empty("UPSTASH_REDIS_REST_URL") {
            self.counter.rest_url = Some(url);
        }
        if let Some(token) = non_empty("UPSTASH_REDIS_REST_TOKEN") {
            self.counter.rest_token = Some(token);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
