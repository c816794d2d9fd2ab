//! Configuration validation

use crate::config::types::CrawlConfig;
use crate::{ConfigError, ConfigResult};

/// Validates a configuration after parsing
///
/// Catches values that would stall or break the session: zero-sized pools,
/// queues that cannot hold the seed, an empty identity.
pub fn validate_config(config: &CrawlConfig) -> ConfigResult<()> {
    if config.crawler.workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.duration_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.duration-secs must be at least 1".to_string(),
        ));
    }

    if config.crawler.word_budget == 0 {
        return Err(ConfigError::Validation(
            "crawler.word-budget must be at least 1".to_string(),
        ));
    }

    if config.crawler.queue_capacity == 0 {
        return Err(ConfigError::Validation(
            "crawler.queue-capacity must be at least 1".to_string(),
        ));
    }

    if config.crawler.sink_workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.sink-workers must be at least 1".to_string(),
        ));
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "http.user-agent must not be empty".to_string(),
        ));
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.output.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
