//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the search endpoint, the crawled
//! site and the Bot API, and run full cycles end-to-end.

use std::sync::Arc;
use tele_trawl::config::{parse_config, Config};
use tele_trawl::crawler::{trawl, QUEUE_KEYWORD};
use tele_trawl::storage::{FrontierStore, SqliteStorage};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const BOT_TOKEN: &str = "123:abc";

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(server: &MockServer, db_path: &str, notifier_enabled: bool) -> Config {
    parse_config(&format!(
        r#"
[search]
keywords = ["telegram channel directory"]
endpoint = "{uri}/html/"

[crawl]
queue-batch-size = 10
max-page-bytes = 65536
request-timeout-ms = 5000

[timing]
keyword-delay-ms = 0
fetch-delay-ms = 0
jitter-ms = 0
cycle-delay-ms = 0

[storage]
database-path = "{db}"

[notifier]
enabled = {enabled}
bot-token = "{token}"
chat-id = "-100"
send-delay-ms = 0
shutdown-timeout-ms = 5000
api-base = "{uri}"
"#,
        uri = server.uri(),
        db = db_path,
        enabled = notifier_enabled,
        token = BOT_TOKEN,
    ))
    .expect("test config should be valid")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

/// Mounts a small site: search results -> /start -> /next
async fn mount_site(server: &MockServer, start_fetches: u64) {
    let uri = server.uri();

    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(html(format!(
            r#"<html><body>
                 <a class="result__a" href="{uri}/start">Directory</a>
                 <a class="result__a" href="{uri}/docs.pdf">PDF</a>
               </body></html>"#
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(html(format!(
            r#"<html><body>
                 <a href="https://t.me/alpha/">Alpha</a>
                 <a href="https://telegram.me/beta">Beta</a>
                 <a href="https://t.me/s/alpha">Preview</a>
                 <a href="/next">Next</a>
                 <a href="{uri}/next#bottom">Next again</a>
                 <a href="https://elsewhere.example/">Elsewhere</a>
               </body></html>"#
        )))
        .expect(start_fetches)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html(
            r#"<html><body>
                 <a href="http://www.t.me/gamma">Gamma</a>
                 <a href="https://t.me/alpha">Alpha again</a>
               </body></html>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 32], "application/pdf"))
        .mount(server)
        .await;
}

async fn mount_bot_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/bot.+/sendMessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(server)
        .await;
}

/// Message texts sent to the Bot API, in arrival order
async fn sent_messages(server: &MockServer) -> Vec<String> {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    requests
        .iter()
        .filter(|r| r.url.path() == format!("/bot{}/sendMessage", BOT_TOKEN))
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_single_cycle_end_to_end() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    mount_bot_api(&server).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("links.db");
    let config = create_test_config(&server, db_path.to_str().unwrap(), true);
    let store = Arc::new(SqliteStorage::new(&db_path).unwrap());

    let cycles = trawl(&config, store.clone(), CancellationToken::new(), true)
        .await
        .unwrap();
    assert_eq!(cycles, 1);

    // Targets are canonical and recorded once; the preview link is not
    assert_eq!(store.count_links().unwrap(), 3);
    for link in ["https://t.me/alpha", "https://t.me/beta", "https://t.me/gamma"] {
        assert!(store.link_exists(link).unwrap(), "{} should be recorded", link);
    }
    assert!(!store.link_exists("https://t.me/s/alpha").unwrap());

    // gamma came from the queued page
    let gamma = store
        .recent_links(10)
        .unwrap()
        .into_iter()
        .find(|r| r.link == "https://t.me/gamma")
        .unwrap();
    assert_eq!(gamma.keyword, QUEUE_KEYWORD);
    assert_eq!(gamma.source_url, format!("{}/next", server.uri()));

    // Search results, the queued page and the non-HTML page are all visited
    assert!(store.is_visited(&format!("{}/start", server.uri())).unwrap());
    assert!(store.is_visited(&format!("{}/next", server.uri())).unwrap());
    assert!(store.is_visited(&format!("{}/docs.pdf", server.uri())).unwrap());
    assert_eq!(store.queue_len().unwrap(), 0);

    // One notification per new link, in discovery order
    let messages = sent_messages(&server).await;
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("https://t\\.me/alpha"));
    assert!(messages[1].contains("https://t\\.me/beta"));
    assert!(messages[2].contains("https://t\\.me/gamma"));
}

#[tokio::test]
async fn test_second_run_skips_visited_pages() {
    let server = MockServer::start().await;
    // /start must be fetched exactly once across both runs
    mount_site(&server, 1).await;
    mount_bot_api(&server).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("links.db");
    let config = create_test_config(&server, db_path.to_str().unwrap(), true);

    {
        let store = Arc::new(SqliteStorage::new(&db_path).unwrap());
        trawl(&config, store, CancellationToken::new(), true)
            .await
            .unwrap();
    }

    // Reopen the database as a restarted process would
    let store = Arc::new(SqliteStorage::new(&db_path).unwrap());
    trawl(&config, store.clone(), CancellationToken::new(), true)
        .await
        .unwrap();

    assert_eq!(store.count_links().unwrap(), 3);
    assert_eq!(sent_messages(&server).await.len(), 3);
}

#[tokio::test]
async fn test_disabled_notifier_still_records_links() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/bot"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("links.db");
    let config = create_test_config(&server, db_path.to_str().unwrap(), false);
    let store = Arc::new(SqliteStorage::new(&db_path).unwrap());

    trawl(&config, store.clone(), CancellationToken::new(), true)
        .await
        .unwrap();

    assert_eq!(store.count_links().unwrap(), 3);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    mount_site(&server, 0).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("links.db");
    let config = create_test_config(&server, db_path.to_str().unwrap(), false);
    let store = Arc::new(SqliteStorage::new(&db_path).unwrap());

    let token = CancellationToken::new();
    token.cancel();

    let cycles = trawl(&config, store.clone(), token, false).await.unwrap();

    assert_eq!(cycles, 0);
    assert_eq!(store.count_links().unwrap(), 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("links.db");
    let mut config = create_test_config(&server, db_path.to_str().unwrap(), false);
    // Seed only; leave the queue for the next process
    config.crawl.queue_batch_size = 1;

    {
        let store = SqliteStorage::new(&db_path).unwrap();
        store
            .enqueue_many(&[format!("{}/unrelated", server.uri())])
            .unwrap();
    }

    let store = Arc::new(SqliteStorage::new(&db_path).unwrap());
    trawl(&config, store.clone(), CancellationToken::new(), true)
        .await
        .unwrap();

    // The older entry was drained first; /next is still waiting
    assert!(store.is_visited(&format!("{}/unrelated", server.uri())).unwrap());
    assert!(!store.is_visited(&format!("{}/next", server.uri())).unwrap());
    assert_eq!(
        store.dequeue_batch(10).unwrap(),
        vec![format!("{}/next", server.uri())]
    );
}
