//! Session statistics
//!
//! A flat block of monotonic counters updated by every worker with lock-free
//! atomic increments. The final snapshot is read after all workers have
//! terminated and printed as the end-of-session summary.

use crate::CrawlError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic counters for one crawl session
#[derive(Debug, Default)]
pub struct SessionStats {
    total_pages: AtomicU64,
    urls_discovered: AtomicU64,
    discovered_new: AtomicU64,
    urls_skipped: AtomicU64,
    skipped_cached: AtomicU64,
    error_total: AtomicU64,
    error_network: AtomicU64,
    error_parse: AtomicU64,
    error_robots: AtomicU64,
}

impl SessionStats {
    /// Creates a zeroed statistics block
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_total_pages(&self) {
        self.total_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_urls_discovered(&self) {
        self.urls_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_discovered_new(&self) {
        self.discovered_new.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_urls_skipped(&self) {
        self.urls_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped_cached(&self) {
        self.skipped_cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages.load(Ordering::Relaxed)
    }

    pub fn urls_discovered(&self) -> u64 {
        self.urls_discovered.load(Ordering::Relaxed)
    }

    pub fn discovered_new(&self) -> u64 {
        self.discovered_new.load(Ordering::Relaxed)
    }

    pub fn urls_skipped(&self) -> u64 {
        self.urls_skipped.load(Ordering::Relaxed)
    }

    pub fn skipped_cached(&self) -> u64 {
        self.skipped_cached.load(Ordering::Relaxed)
    }

    pub fn error_total(&self) -> u64 {
        self.error_total.load(Ordering::Relaxed)
    }

    pub fn error_network(&self) -> u64 {
        self.error_network.load(Ordering::Relaxed)
    }

    pub fn error_parse(&self) -> u64 {
        self.error_parse.load(Ordering::Relaxed)
    }

    pub fn error_robots(&self) -> u64 {
        self.error_robots.load(Ordering::Relaxed)
    }

    /// Records a terminal error under its taxonomy counter plus the total
    ///
    /// `Cancelled` is not an error of the crawl, only of the clock, and is
    /// deliberately not counted.
    pub fn record_error(&self, err: &CrawlError) {
        match err {
            CrawlError::Cancelled => return,
            CrawlError::RobotsDenied { .. } => {
                self.error_robots.fetch_add(1, Ordering::Relaxed);
            }
            CrawlError::UrlParse(_) | CrawlError::Parse { .. } | CrawlError::Config(_) => {
                self.error_parse.fetch_add(1, Ordering::Relaxed);
            }
            CrawlError::Http { .. }
            | CrawlError::Timeout { .. }
            | CrawlError::Database(_)
            | CrawlError::Storage(_)
            | CrawlError::Io(_) => {
                self.error_network.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.error_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Average crawl throughput over the session
    pub fn pages_per_second(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_pages() as f64 / secs
    }

    /// Prints the end-of-session summary to stdout
    pub fn print_summary(&self, elapsed: Duration) {
        println!("===================================================");
        println!("                  SESSION SUMMARY                  ");
        println!("===================================================");
        println!();
        println!("TOTAL PAGES CRAWLED          : {}", self.total_pages());
        println!(
            "PAGES PER SECOND             : {:.2}",
            self.pages_per_second(elapsed)
        );
        println!();
        println!("URLS DISCOVERED              : {}", self.urls_discovered());
        println!("    - new links found        : {}", self.discovered_new());
        println!();
        println!("URLS SKIPPED                 : {}", self.urls_skipped());
        println!("    - already in cache       : {}", self.skipped_cached());
        println!();
        println!("ERROR COUNT                  : {}", self.error_total());
        println!("    - network or timeout     : {}", self.error_network());
        println!("    - parse failures         : {}", self.error_parse());
        println!("    - robots denials         : {}", self.error_robots());
        println!();
        println!("===================================================");
    }
}
