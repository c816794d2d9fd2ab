//! Session-lifetime shared state
//!
//! The caches here are created once per session and shared by every worker:
//! the URL seen set (deduplication memory) and the per-host robots verdict
//! cache. Both are insert-only for the lifetime of the session.

mod domains;
mod seen;

pub use domains::DomainCache;
pub use seen::UrlSeen;
