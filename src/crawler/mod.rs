//! Crawl engine
//!
//! This module contains the crawling core: the session engine and its
//! fabric, the per-URL worker state machine, HTTP fetching, the per-host
//! rate limiter, and the streaming page extractor.

mod engine;
mod extractor;
mod fetcher;
mod limiter;
mod worker;

pub use engine::Engine;
pub use extractor::{extract_page, ExtractorContext};
pub use fetcher::{build_http_client, fetch_page};
pub use limiter::RateLimiter;

pub(crate) use fetcher::classify_fetch_error;
