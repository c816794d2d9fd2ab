//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for crawled hosts and drive full
//! sessions end-to-end: seeding, robots evaluation, politeness, extraction,
//! and persistence.

use harvestman::config::CrawlConfig;
use harvestman::crawler::Engine;
use harvestman::storage::{PageRecord, PageSink, SqliteStore, StorageResult};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that records everything it is handed, for asserting on the exact
/// set of page records a session emits
#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<PageRecord>>,
}

impl MemorySink {
    fn records(&self) -> Vec<PageRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl PageSink for MemorySink {
    fn persist(&self, record: &PageRecord) -> StorageResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Short-session configuration for tests
fn test_config(duration_secs: u64) -> CrawlConfig {
    let mut config = CrawlConfig::default();
    config.crawler.workers = 4;
    config.crawler.sink_workers = 2;
    config.crawler.duration_secs = duration_secs;
    config.crawler.per_host_delay_ms = 100;
    config.http.user_agent = "HarvestmanTest/1.0".to_string();
    config
}

fn host_key_of(uri: &str) -> String {
    let url = Url::parse(uri).expect("mock server uri");
    format!(
        "{}:{}",
        url.host_str().expect("mock server host"),
        url.port().expect("mock server port")
    )
}

async fn mount_allow_all_robots(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_seed_and_discovered_link_are_both_persisted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                r#"<html><body><a href="/b">next</a> some page text</body></html>"#,
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>second page text</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let db_path = format!("/tmp/harvestman_s1_{}.db", std::process::id());
    let _ = std::fs::remove_file(&db_path);

    let store = Arc::new(SqliteStore::open(std::path::Path::new(&db_path)).unwrap());
    let engine = Engine::new(test_config(2), Arc::clone(&store) as Arc<dyn PageSink>).unwrap();
    engine.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(engine.stats().total_pages(), 2);
    assert_eq!(store.page_count().unwrap(), 2);

    let seed_content = store.page_content(&format!("{}/", base)).unwrap();
    assert!(seed_content.unwrap().contains("some page text"));

    let linked_content = store.page_content(&format!("{}/b", base)).unwrap();
    assert!(linked_content.unwrap().contains("second page text"));

    // The allow verdict was cached after one robots fetch (expect(1) above)
    assert_eq!(engine.domains().check(&host_key_of(&base)), Some(true));

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_robots_403_denies_whole_host() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    // The page itself must never be fetched
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hidden</html>"))
        .expect(0)
        .mount(&server)
        .await;

    let sink = Arc::new(MemorySink::default());
    let engine = Engine::new(test_config(2), Arc::clone(&sink) as Arc<dyn PageSink>).unwrap();
    engine.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(engine.stats().total_pages(), 0);
    assert_eq!(engine.stats().error_robots(), 1);
    assert_eq!(engine.stats().error_total(), 1);
    assert_eq!(engine.domains().check(&host_key_of(&base)), Some(false));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_word_budget_truncates_but_links_survive() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_allow_all_robots(&server).await;

    // 600 words in 10-word paragraphs, then three links
    let mut body = String::from("<html><body>");
    for i in 0..60 {
        body.push_str(&format!(
            "<p>p{0}w0 p{0}w1 p{0}w2 p{0}w3 p{0}w4 p{0}w5 p{0}w6 p{0}w7 p{0}w8 p{0}w9</p>",
            i
        ));
    }
    body.push_str(r#"<a href="/l1">one</a><a href="/l2">two</a><a href="/l3">three</a>"#);
    body.push_str("</body></html>");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    for link in ["/l1", "/l2", "/l3"] {
        Mock::given(method("GET"))
            .and(path(link))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>leaf</body></html>"),
            )
            .mount(&server)
            .await;
    }

    let sink = Arc::new(MemorySink::default());
    let engine = Engine::new(test_config(2), Arc::clone(&sink) as Arc<dyn PageSink>).unwrap();
    engine.run(&format!("{}/", base)).await.unwrap();

    assert!(engine.stats().urls_discovered() >= 3);

    let records = sink.records();
    let seed_record = records
        .iter()
        .find(|r| r.url == format!("{}/", base))
        .expect("seed page persisted");

    // Capture stopped once the 500-word budget was crossed
    let words = seed_record.content.split_whitespace().count();
    assert!(
        (500..=520).contains(&words),
        "expected ~500 captured words, got {}",
        words
    );
}

#[tokio::test]
async fn test_mailto_link_fails_while_sibling_crawls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="mailto:x@y">mail</a><a href="/ok">ok</a></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>fine</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(MemorySink::default());
    let engine = Engine::new(test_config(2), Arc::clone(&sink) as Arc<dyn PageSink>).unwrap();
    engine.run(&format!("{}/", base)).await.unwrap();

    // Both hrefs were resolved and queued; the mailto fetch then failed
    assert_eq!(engine.stats().urls_discovered(), 2);
    assert!(engine.stats().error_parse() >= 1);
    assert_eq!(engine.stats().total_pages(), 2);

    let records = sink.records();
    assert!(records.iter().any(|r| r.url == format!("{}/ok", base)));
    assert!(!records.iter().any(|r| r.url.starts_with("mailto:")));
}

#[tokio::test]
async fn test_repeated_link_is_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_allow_all_robots(&server).await;

    // Both pages link to each other and to themselves; every URL must still
    // be fetched at most once
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="/">self</a><a href="/b">b</a></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="/">back</a><a href="/b">self</a></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(MemorySink::default());
    let engine = Engine::new(test_config(2), Arc::clone(&sink) as Arc<dyn PageSink>).unwrap();
    engine.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(engine.stats().total_pages(), 2);
    assert!(engine.stats().skipped_cached() >= 2);
    assert_eq!(sink.records().len(), 2);
}
