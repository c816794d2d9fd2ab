//! Crawl session engine
//!
//! Wires the work-distribution fabric: three bounded queues (discovery,
//! ready, entries), a bridge task moving discovery → ready, a fixed pool of
//! crawl workers, a pool of persistence sinks, and the global deadline that
//! shuts the whole thing down.
//!
//! Shutdown order is driven by channel closure. The deadline cancels the
//! bridge, which closes the ready queue by dropping its sender; workers
//! drain ready and exit, dropping their entries senders; the sinks drain
//! entries and exit. The engine then joins every task.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::limiter::RateLimiter;
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::state::{DomainCache, UrlSeen};
use crate::stats::SessionStats;
use crate::storage::{PageRecord, PageSink};
use crate::{ConfigError, CrawlError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// One crawl session: shared state plus the fabric to run it
pub struct Engine {
    config: CrawlConfig,
    client: Client,
    sink: Arc<dyn PageSink>,
    stats: Arc<SessionStats>,
    seen: Arc<UrlSeen>,
    domains: Arc<DomainCache>,
    limiter: Arc<RateLimiter>,
}

impl Engine {
    /// Creates an engine with fresh session state
    ///
    /// # Arguments
    ///
    /// * `config` - Validated session configuration
    /// * `sink` - Destination for harvested page records
    pub fn new(config: CrawlConfig, sink: Arc<dyn PageSink>) -> Result<Self, CrawlError> {
        // A client build only fails on bad configuration, e.g. a user agent
        // that is not a valid header value
        let client = build_http_client(&config.http.user_agent)
            .map_err(|err| ConfigError::Validation(format!("HTTP client setup failed: {}", err)))?;
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.crawler.per_host_delay_ms,
        )));

        Ok(Self {
            config,
            client,
            sink,
            stats: Arc::new(SessionStats::new()),
            seen: Arc::new(UrlSeen::new()),
            domains: Arc::new(DomainCache::new()),
            limiter,
        })
    }

    /// Session statistics (final after `run` returns)
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Per-host robots verdicts accumulated during the session
    pub fn domains(&self) -> &DomainCache {
        &self.domains
    }

    /// Runs one crawl session from the given seed until the deadline
    pub async fn run(&self, seed: &str) -> Result<(), CrawlError> {
        let capacity = self.config.crawler.queue_capacity;
        let (discovery_tx, mut discovery_rx) = mpsc::channel::<String>(capacity);
        let (ready_tx, ready_rx) = mpsc::channel::<String>(capacity);
        let (entries_tx, entries_rx) = mpsc::channel::<PageRecord>(capacity);
        let cancel = CancellationToken::new();

        // Global deadline: the single source of shutdown
        let deadline = Duration::from_secs(self.config.crawler.duration_secs);
        let timer_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            tracing::info!("session deadline reached, shutting down");
            timer_cancel.cancel();
        });

        // Seed the crawl; the seed counts as seen so a page linking back to
        // it cannot queue it a second time
        self.seen.insert(seed);
        discovery_tx
            .send(seed.to_string())
            .await
            .map_err(|_| CrawlError::Cancelled)?;
        tracing::info!(%seed, "session seeded");

        // Bridge: sole writer to ready after seeding; closing ready on
        // deadline is what lets the workers exit
        let bridge_cancel = cancel.clone();
        let bridge = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = bridge_cancel.cancelled() => break,
                    job = discovery_rx.recv() => match job {
                        Some(url) => {
                            if ready_tx.send(url).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        // Persistence sinks share the entries queue
        let entries_rx = Arc::new(Mutex::new(entries_rx));
        let mut sink_handles = Vec::with_capacity(self.config.crawler.sink_workers);
        for id in 0..self.config.crawler.sink_workers {
            sink_handles.push(tokio::spawn(run_sink(
                id + 1,
                Arc::clone(&self.sink),
                Arc::clone(&self.stats),
                Arc::clone(&entries_rx),
            )));
        }

        // Crawl workers share the ready queue
        let ready_rx = Arc::new(Mutex::new(ready_rx));
        let mut worker_handles = Vec::with_capacity(self.config.crawler.workers);
        for id in 0..self.config.crawler.workers {
            let ctx = WorkerContext {
                client: self.client.clone(),
                agent: self.config.http.user_agent.clone(),
                request_timeout: Duration::from_secs(self.config.http.request_timeout_secs),
                word_budget: self.config.crawler.word_budget,
                limiter: Arc::clone(&self.limiter),
                seen: Arc::clone(&self.seen),
                domains: Arc::clone(&self.domains),
                stats: Arc::clone(&self.stats),
                discovery: discovery_tx.clone(),
                entries: entries_tx.clone(),
                cancel: cancel.clone(),
            };
            worker_handles.push(tokio::spawn(run_worker(id + 1, ctx, Arc::clone(&ready_rx))));
        }

        // The workers hold the only remaining senders: entries closes when
        // the last worker exits, discovery when the bridge is gone too
        drop(discovery_tx);
        drop(entries_tx);

        for handle in worker_handles {
            let _ = handle.await;
        }
        tracing::debug!("all workers exited");

        for handle in sink_handles {
            let _ = handle.await;
        }
        tracing::debug!("all sinks drained");

        let _ = bridge.await;
        Ok(())
    }
}

/// Sink worker loop: drain the entries queue until it closes
///
/// Upserts run on the blocking pool. A failed write is recorded and logged;
/// the sink keeps consuming.
async fn run_sink(
    id: usize,
    sink: Arc<dyn PageSink>,
    stats: Arc<SessionStats>,
    entries: Arc<Mutex<mpsc::Receiver<PageRecord>>>,
) {
    loop {
        let record = { entries.lock().await.recv().await };
        let Some(record) = record else {
            break;
        };

        let url = record.url.clone();
        let sink = Arc::clone(&sink);
        match tokio::task::spawn_blocking(move || sink.persist(&record)).await {
            Ok(Ok(())) => {
                stats.inc_discovered_new();
                tracing::debug!(sink = id, %url, "page stored");
            }
            Ok(Err(err)) => {
                let err = CrawlError::Storage(err);
                stats.record_error(&err);
                tracing::warn!(sink = id, %url, error = %err, "failed to store page");
            }
            Err(err) => {
                tracing::error!(sink = id, %url, error = %err, "sink write task failed");
            }
        }
    }

    tracing::debug!(sink = id, "entries queue closed, sink exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageResult;

    struct NullSink;

    impl PageSink for NullSink {
        fn persist(&self, _record: &PageRecord) -> StorageResult<()> {
            Ok(())
        }
    }

    fn small_config() -> CrawlConfig {
        let mut config = CrawlConfig::default();
        config.crawler.workers = 2;
        config.crawler.sink_workers = 2;
        config.crawler.duration_secs = 1;
        config
    }

    #[test]
    fn test_engine_new() {
        let engine = Engine::new(small_config(), Arc::new(NullSink));
        assert!(engine.is_ok());
    }

    #[tokio::test]
    async fn test_session_ends_at_deadline_with_unreachable_seed() {
        // Nothing listens on this port; the session must still terminate
        // cleanly once the deadline closes the ready queue.
        let engine = Engine::new(small_config(), Arc::new(NullSink)).unwrap();
        engine.run("http://127.0.0.1:9/").await.unwrap();

        assert_eq!(engine.stats().total_pages(), 0);
    }
}
