//! Configuration file loading

use crate::config::types::CrawlConfig;
use crate::config::validation::validate_config;
use crate::ConfigResult;
use std::path::Path;

/// Loads and validates a configuration from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - File read, TOML parse, or validation failure
pub fn load_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses and validates a configuration from TOML text
pub fn parse_config(contents: &str) -> ConfigResult<CrawlConfig> {
    let config: CrawlConfig = toml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}
