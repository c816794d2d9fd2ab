//! Robots.txt evaluation
//!
//! A worker calls [`permit`] before fetching any URL. The verdict for a host
//! is computed at most once per session: the first caller fetches and
//! evaluates `/robots.txt`, every later caller hits the domain cache. A host
//! that cannot serve robots.txt is off-limits for the rest of the session.

use crate::crawler::classify_fetch_error;
use crate::state::DomainCache;
use crate::CrawlError;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Deadline for the robots.txt fetch, independent of the session deadline
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether the configured agent may fetch the given URL
///
/// Consults the domain cache first; on a miss, fetches
/// `scheme://host/robots.txt` and evaluates the agent against the URL's
/// request path. The verdict is cached for the session:
///
/// * 200 and the path is allowed → host allowed
/// * 200 and the path is denied → host denied, `RobotsDenied`
/// * any other status → host denied, `RobotsDenied`
/// * network failure → host denied, network error
///
/// A fetch interrupted by the session deadline returns `Cancelled` without
/// caching a verdict, so the host gets a fresh evaluation if it is ever
/// queued again in a later session.
pub async fn permit(
    client: &Client,
    agent: &str,
    url: &Url,
    host_key: &str,
    cache: &DomainCache,
    cancel: &CancellationToken,
) -> Result<(), CrawlError> {
    match cache.check(host_key) {
        Some(true) => {
            tracing::debug!(host = host_key, "robots verdict from cache: allowed");
            return Ok(());
        }
        Some(false) => {
            tracing::debug!(host = host_key, "robots verdict from cache: denied");
            return Err(CrawlError::RobotsDenied {
                url: url.to_string(),
            });
        }
        None => {}
    }

    let mut robots_url = url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    let send = client.get(robots_url.clone()).timeout(ROBOTS_TIMEOUT).send();
    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        response = send => response,
    };

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(host = host_key, error = %err, "robots.txt fetch failed, denying host");
            cache.add(host_key, false);
            return Err(classify_fetch_error(robots_url.as_str(), err));
        }
    };

    if !response.status().is_success() {
        tracing::info!(
            host = host_key,
            status = response.status().as_u16(),
            "robots.txt unavailable, denying host"
        );
        cache.add(host_key, false);
        return Err(CrawlError::RobotsDenied {
            url: url.to_string(),
        });
    }

    let body = tokio::select! {
        _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
        body = response.text() => match body {
            Ok(body) => body,
            Err(err) => {
                cache.add(host_key, false);
                return Err(classify_fetch_error(robots_url.as_str(), err));
            }
        },
    };

    let path = request_path(url);
    let mut matcher = DefaultMatcher::default();
    if matcher.one_agent_allowed_by_robots(&body, agent, &path) {
        tracing::debug!(host = host_key, "robots.txt allows agent");
        cache.add(host_key, true);
        Ok(())
    } else {
        tracing::info!(host = host_key, path = %path, "robots.txt denies agent");
        cache.add(host_key, false);
        Err(CrawlError::RobotsDenied {
            url: url.to_string(),
        })
    }
}

/// Builds the path tested against robots rules: escaped path plus raw query
fn request_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
