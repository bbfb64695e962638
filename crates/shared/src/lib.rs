//! Shared library for the AnimeHub workspace.
//!
//! This crate provides common functionality used by the API clients and the
//! front-end binary:
//! - Configuration management
//! - Logging infrastructure
//! - Domain models (anime records, feed queries, watchlist rows, sessions)

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
