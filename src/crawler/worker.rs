//! Per-URL crawl worker
//!
//! Each worker repeatedly takes a URL from the ready queue and runs it
//! through the crawl state machine: parse → robots verdict → rate-limit
//! wait → fetch → extract → emit record. Every failure abandons the URL;
//! there is no retry.

use crate::crawler::extractor::{extract_page, ExtractorContext};
use crate::crawler::fetcher::fetch_page;
use crate::crawler::limiter::RateLimiter;
use crate::robots;
use crate::state::{DomainCache, UrlSeen};
use crate::stats::SessionStats;
use crate::storage::PageRecord;
use crate::CrawlError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared session handles given to every worker
pub(crate) struct WorkerContext {
    pub client: Client,
    pub agent: String,
    pub request_timeout: Duration,
    pub word_budget: usize,
    pub limiter: Arc<RateLimiter>,
    pub seen: Arc<UrlSeen>,
    pub domains: Arc<DomainCache>,
    pub stats: Arc<SessionStats>,
    pub discovery: mpsc::Sender<String>,
    pub entries: mpsc::Sender<PageRecord>,
    pub cancel: CancellationToken,
}

/// Derives the politeness key for a URL: lowercase host, plus the port when
/// present so distinct servers on one address get distinct gates
pub(crate) fn host_key(url: &Url) -> Result<String, CrawlError> {
    let host = url.host_str().ok_or_else(|| CrawlError::Parse {
        url: url.to_string(),
        message: "URL has no host".to_string(),
    })?;

    let mut key = host.to_ascii_lowercase();
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    Ok(key)
}

/// Runs one URL through the crawl state machine
pub(crate) async fn process_url(ctx: &WorkerContext, raw_url: &str) -> Result<(), CrawlError> {
    let url = Url::parse(raw_url)?;
    let host = host_key(&url)?;

    robots::permit(
        &ctx.client,
        &ctx.agent,
        &url,
        &host,
        &ctx.domains,
        &ctx.cancel,
    )
    .await?;

    ctx.limiter.acquire(&host, &ctx.cancel).await?;

    let body = fetch_page(&ctx.client, &url, ctx.request_timeout, &ctx.cancel).await?;
    ctx.stats.inc_total_pages();

    let content = extract_page(
        &body,
        &url,
        &ExtractorContext {
            discovery: &ctx.discovery,
            seen: &ctx.seen,
            stats: &ctx.stats,
            cancel: &ctx.cancel,
            word_budget: ctx.word_budget,
        },
    )?;

    let record = PageRecord {
        url: url.into(),
        content,
    };
    if ctx.entries.send(record).await.is_err() {
        tracing::warn!("entries queue closed before record could be queued");
    }

    Ok(())
}

/// Worker loop: drain the ready queue until it closes
pub(crate) async fn run_worker(
    id: usize,
    ctx: WorkerContext,
    ready: Arc<Mutex<mpsc::Receiver<String>>>,
) {
    loop {
        let job = { ready.lock().await.recv().await };
        let Some(url) = job else {
            break;
        };

        tracing::debug!(worker = id, %url, "dequeued");
        match process_url(&ctx, &url).await {
            Ok(()) => {}
            Err(CrawlError::Cancelled) => {
                tracing::debug!(worker = id, %url, "abandoned at deadline");
            }
            Err(err) => {
                ctx.stats.record_error(&err);
                tracing::warn!(worker = id, %url, error = %err, "abandoning url");
            }
        }
    }

    tracing::debug!(worker = id, "ready queue closed, worker exiting");
}
