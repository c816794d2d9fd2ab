//! Per-host robots verdict cache
//!
//! Maps a host key to whether the session is allowed to crawl it. A host is
//! written at most once, after its robots.txt has been evaluated; absence
//! means the host has not been evaluated yet. Negative verdicts persist for
//! the whole session, which bounds robots fetches at one per host.

use std::collections::HashMap;
use std::sync::RwLock;

/// Host → allowed cache shared by all workers
#[derive(Debug, Default)]
pub struct DomainCache {
    domains: RwLock<HashMap<String, bool>>,
}

impl DomainCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached verdict for a host, or `None` if not yet evaluated
    pub fn check(&self, host: &str) -> Option<bool> {
        let domains = self.domains.read().unwrap_or_else(|e| e.into_inner());
        domains.get(host).copied()
    }

    /// Records the robots verdict for a host
    pub fn add(&self, host: &str, allowed: bool) {
        let mut domains = self.domains.write().unwrap_or_else(|e| e.into_inner());
        domains.insert(host.to_string(), allowed);
    }
}
