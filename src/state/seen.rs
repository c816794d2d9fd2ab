//! URL seen set
//!
//! Records every URL ever submitted to the crawl and answers membership.
//! Entries are never removed during a session, so membership is monotone:
//! once a URL is seen it stays seen.

use std::collections::HashSet;
use std::sync::RwLock;

/// Insert-only set of URLs already submitted to the crawl
///
/// Shared by all workers. The insert path combines the membership check and
/// the insertion under a single write lock, so two workers racing on the same
/// freshly discovered URL cannot both observe it as new.
#[derive(Debug, Default)]
pub struct UrlSeen {
    urls: RwLock<HashSet<String>>,
}

impl UrlSeen {
    /// Creates an empty seen set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL, returning `true` if it was not seen before
    pub fn insert(&self, url: &str) -> bool {
        let mut urls = self.urls.write().unwrap_or_else(|e| e.into_inner());
        urls.insert(url.to_string())
    }

    /// Returns whether a URL has already been recorded
    pub fn contains(&self, url: &str) -> bool {
        let urls = self.urls.read().unwrap_or_else(|e| e.into_inner());
        urls.contains(url)
    }

    /// Number of URLs recorded so far
    pub fn len(&self) -> usize {
        let urls = self.urls.read().unwrap_or_else(|e| e.into_inner());
        urls.len()
    }

    /// Returns whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
