//! Per-host rate limiter
//!
//! Each host gets a gate recording the next instant a fetch may start. The
//! map lock is held only for lookup-or-create and released before the gate
//! lock is taken, so the sleep never blocks other hosts. Callers for the
//! same host queue behind the gate lock in acquisition order.

use crate::CrawlError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-host politeness record
#[derive(Debug)]
struct Gate {
    delay: Duration,
    next_allowed: tokio::sync::Mutex<Instant>,
}

/// Serializes fetch starts per host with a minimum delay between them
#[derive(Debug)]
pub struct RateLimiter {
    hosts: Mutex<HashMap<String, Arc<Gate>>>,
    default_delay: Duration,
}

impl RateLimiter {
    /// Creates a rate limiter with the given per-host delay
    pub fn new(default_delay: Duration) -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            default_delay,
        }
    }

    /// Blocks until the host's next-allowed instant, then advances it
    ///
    /// The first request to a host returns immediately. Between two
    /// successful acquires for the same host at least the configured delay
    /// elapses. A wait interrupted by the session deadline returns
    /// `Cancelled` and leaves the gate untouched, so the next caller is not
    /// penalized for the abandoned slot.
    pub async fn acquire(&self, host: &str, cancel: &CancellationToken) -> Result<(), CrawlError> {
        let key = host.to_ascii_lowercase();

        let gate = {
            let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            match hosts.get(&key) {
                Some(gate) => Arc::clone(gate),
                None => {
                    let gate = Arc::new(Gate {
                        delay: self.default_delay,
                        next_allowed: tokio::sync::Mutex::new(Instant::now() + self.default_delay),
                    });
                    hosts.insert(key, gate);
                    // First touch of a host never waits
                    return Ok(());
                }
            }
        };

        let mut next_allowed = gate.next_allowed.lock().await;
        let wait = next_allowed.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(host, wait_ms = wait.as_millis() as u64, "rate limit pause");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            }
        }
        *next_allowed = Instant::now() + gate.delay;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_returns_immediately() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire("a.test", &cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_waits_full_delay() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire("a.test", &cancel).await.unwrap();
        limiter.acquire("a.test", &cancel).await.unwrap();
        assert!(start.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_do_not_block_each_other() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire("a.test", &cancel).await.unwrap();
        limiter.acquire("b.test", &cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_key_is_case_insensitive() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire("A.Test", &cancel).await.unwrap();
        limiter.acquire("a.test", &cancel).await.unwrap();
        assert!(start.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_returns_cancelled() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        limiter.acquire("a.test", &cancel).await.unwrap();
        cancel.cancel();
        let result = limiter.acquire("a.test", &cancel).await;
        assert!(matches!(result, Err(CrawlError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_does_not_advance_gate() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire("a.test", &cancel).await.unwrap();

        let doomed = CancellationToken::new();
        doomed.cancel();
        assert!(limiter.acquire("a.test", &doomed).await.is_err());

        // The abandoned slot must not push next_allowed further out: the
        // following acquire completes one delay after the first, not two.
        limiter.acquire("a.test", &cancel).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= DELAY);
        assert!(elapsed < DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_after_idle_period_is_immediate() {
        let limiter = RateLimiter::new(DELAY);
        let cancel = CancellationToken::new();

        limiter.acquire("a.test", &cancel).await.unwrap();
        tokio::time::sleep(DELAY * 3).await;

        let start = Instant::now();
        limiter.acquire("a.test", &cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
