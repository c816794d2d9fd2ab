//! Configuration handling
//!
//! Configuration is loaded from an optional TOML file and overridden by CLI
//! flags. Every tunable of the crawl session lives here: worker counts,
//! session duration, politeness delay, the word budget, queue capacities,
//! and the HTTP identity.

mod parser;
mod types;
mod validation;

pub use parser::{load_config, parse_config};
pub use types::{CrawlConfig, CrawlerSection, HttpSection, OutputSection};
pub use validation::validate_config;
