//! Configuration management for AnimeHub.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `supabase.url`
pub const SUPABASE_URL_ENV: &str = "ANIMEHUB_SUPABASE_URL";

/// Environment variable overriding `supabase.anon_key`
pub const SUPABASE_KEY_ENV: &str = "ANIMEHUB_SUPABASE_ANON_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Metadata API settings
    pub jikan: JikanConfig,

    /// Auth and watchlist storage settings
    #[serde(default)]
    pub supabase: SupabaseConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,

    /// Persisted session file (relative to data directory or absolute)
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output (stderr)
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Jikan metadata API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JikanConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Items requested per feed/search page
    pub page_size: u32,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Supabase (auth + row storage) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public anon key sent as `apikey`
    pub anon_key: String,

    /// Table holding watchlist rows
    pub table: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

fn default_session_file() -> String {
    "session.json".to_string()
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: "watchlist".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
                session_file: default_session_file(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: false,
                file: true,
                json_format: false,
            },
            jikan: JikanConfig {
                base_url: "https://api.jikan.moe/v4".to_string(),
                page_size: 12,
                timeout_seconds: 30,
                user_agent: "AnimeHub/0.1.0".to_string(),
            },
            supabase: SupabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    /// Supabase credentials may be overridden from the environment either way.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            Self::default()
        } else {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            tracing::info!(
                path = %path.display(),
                "Configuration loaded successfully"
            );
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Replace Supabase credentials with values found through `lookup`
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SUPABASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.supabase.url = url;
        }
        if let Some(key) = lookup(SUPABASE_KEY_ENV).filter(|v| !v.is_empty()) {
            self.supabase.anon_key = key;
        }
    }

    /// Whether the auth/storage backend has enough settings to be contacted
    pub fn supabase_configured(&self) -> bool {
        !self.supabase.url.is_empty() && !self.supabase.anon_key.is_empty()
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    /// Get the path for the persisted session file
    pub fn session_path(&self) -> PathBuf {
        self.resolve(&self.data.session_file)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}
