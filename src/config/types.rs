use serde::Deserialize;

/// Browser-like identity presented to crawled servers
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for a crawl session
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlConfig {
    #[serde(default)]
    pub crawler: CrawlerSection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerSection {
    /// Number of concurrent crawl workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Session duration in seconds; the deadline cancels all in-flight work
    #[serde(rename = "duration-secs", default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Minimum time between two fetch starts against the same host
    #[serde(rename = "per-host-delay-ms", default = "default_per_host_delay_ms")]
    pub per_host_delay_ms: u64,

    /// Soft cap on captured visible-text words per page
    #[serde(rename = "word-budget", default = "default_word_budget")]
    pub word_budget: usize,

    /// Capacity of the discovery, ready, and entries queues
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of persistence sink workers
    #[serde(rename = "sink-workers", default = "default_sink_workers")]
    pub sink_workers: usize,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// User-Agent header sent with every request, including robots.txt
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request deadline in seconds (content and robots fetches alike)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the append-only log file
    #[serde(rename = "log-path", default = "default_log_path")]
    pub log_path: String,
}

fn default_workers() -> usize {
    20
}

fn default_duration_secs() -> u64 {
    20
}

fn default_per_host_delay_ms() -> u64 {
    1000
}

fn default_word_budget() -> usize {
    500
}

fn default_queue_capacity() -> usize {
    5000
}

fn default_sink_workers() -> usize {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_database_path() -> String {
    "crawl.db".to_string()
}

fn default_log_path() -> String {
    "db.log".to_string()
}

impl Default for CrawlerSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            duration_secs: default_duration_secs(),
            per_host_delay_ms: default_per_host_delay_ms(),
            word_budget: default_word_budget(),
            queue_capacity: default_queue_capacity(),
            sink_workers: default_sink_workers(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_path: default_log_path(),
        }
    }
}
