//! HTTP fetching
//!
//! One connection-pooled client serves all workers; per-request deadlines
//! keep a slow host from pinning a worker, and the session cancellation
//! token aborts in-flight requests when the deadline fires.

use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Builds the shared HTTP client
///
/// The client carries the session User-Agent on every request and pools
/// connections across all workers.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(5))
        .gzip(true)
        .build()
}

/// Maps a reqwest failure onto the crawl error taxonomy
pub(crate) fn classify_fetch_error(url: &str, err: reqwest::Error) -> CrawlError {
    if err.is_timeout() {
        CrawlError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: err,
        }
    }
}

/// Fetches a page body
///
/// Issues a GET with the per-request deadline; only 2xx responses yield a
/// body. The session cancellation token aborts both the request and the
/// body read. No retry: a failed URL is abandoned.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String, CrawlError> {
    let send = client.get(url.clone()).timeout(timeout).send();
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        response = send => response.map_err(|e| classify_fetch_error(url.as_str(), e))?,
    };

    let response = response
        .error_for_status()
        .map_err(|e| classify_fetch_error(url.as_str(), e))?;

    let body = tokio::select! {
        _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        body = response.text() => body.map_err(|e| classify_fetch_error(url.as_str(), e))?,
    };

    Ok(body)
}
