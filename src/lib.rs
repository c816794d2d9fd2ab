//! Harvestman: a polite, time-boxed web crawler
//!
//! This crate implements a concurrent crawler that seeds from a single URL,
//! fetches pages while honoring robots.txt and per-host rate limits, harvests
//! visible text, and upserts the result into a SQLite store with a full-text
//! index for the companion search CLI.

pub mod config;
pub mod crawler;
pub mod robots;
pub mod state;
pub mod stats;
pub mod storage;

use thiserror::Error;

/// Main error type for harvestman operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session deadline expired")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for harvestman operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::Engine;
pub use state::{DomainCache, UrlSeen};
pub use stats::SessionStats;
pub use storage::{PageRecord, PageSink, SqliteStore};
