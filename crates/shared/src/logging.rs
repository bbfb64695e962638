//! Logging infrastructure for AnimeHub.
//!
//! This module provides structured logging with daily file rotation and
//! per-crate log levels. Console output goes to stderr so that program
//! output on stdout stays readable.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Crates whose events follow the configured default level
const WORKSPACE_TARGETS: [&str; 4] = ["animehub", "shared", "jikan_client", "supabase_client"];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log directory path
    pub log_dir: String,
    /// Component name (used for log file naming)
    pub component: String,
    /// Default log level
    pub default_level: Level,
    /// Enable console output
    pub console: bool,
    /// Enable file output
    pub file: bool,
    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "data/logs".to_string(),
            component: "animehub".to_string(),
            default_level: Level::INFO,
            console: false,
            file: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Build a log configuration from the `[logging]` config section
    ///
    /// Unknown level names fall back to `info`.
    pub fn from_settings(settings: &LoggingConfig, log_dir: &Path, component: &str) -> Self {
        Self {
            log_dir: log_dir.to_string_lossy().to_string(),
            component: component.to_string(),
            default_level: settings.default_level.parse().unwrap_or(Level::INFO),
            console: settings.console,
            file: settings.file,
            json_format: settings.json_format,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set
    fn default_directive(&self) -> String {
        let mut parts: Vec<String> = WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.default_level))
            .collect();
        parts.push("hyper=warn,reqwest=warn,h2=warn".to_string());
        parts.join(",")
    }
}

/// Initialize logging with the given configuration
///
/// Sets up tracing with:
/// - Daily file rotation
/// - Structured logging with contextual fields
/// - Crate-specific log levels, overridable via `RUST_LOG`
/// - Optional JSON formatting
pub fn init(config: LogConfig) -> Result<()> {
    let log_dir = Path::new(&config.log_dir);
    if config.file {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", config.log_dir))?;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let mut layers = Vec::new();

    if config.console {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(std::io::stderr)
            .boxed();
        layers.push(console_layer);
    }

    if config.file {
        let file_appender = tracing_appender::rolling::daily(log_dir, &config.component);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_appender)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender)
                .boxed()
        };

        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        component = %config.component,
        log_dir = %config.log_dir,
        "Logging initialized"
    );

    Ok(())
}
