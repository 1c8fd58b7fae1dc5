//! HTTP fetcher implementation
//!
//! This module handles all page downloads for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Following redirects
//! - Skipping non-HTML responses before reading the body
//! - Streaming bodies with a byte ceiling
//! - Error classification

use crate::TrawlError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
///
/// Every variant is a definitive outcome for the URL: the page processor marks
/// the URL visited for all of them.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched an HTML page
    Page {
        /// Final URL after redirects
        final_url: String,
        /// Page body, decoded as UTF-8 with invalid sequences replaced
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    NotHtml {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Body exceeded the byte ceiling and was abandoned
    TooLarge {
        /// The ceiling that was exceeded
        limit: u64,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Downloads pages for the page processor
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`, abandoning the body once it exceeds `max_bytes`
    ///
    /// Transport failures are reported as [`FetchOutcome`] variants. An `Err`
    /// means the fetch could not be attempted at all.
    async fn fetch(&self, url: &str, max_bytes: Option<u64>) -> Result<FetchOutcome, TrawlError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Overall per-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tele_trawl::crawler::build_http_client;
///
/// let client = build_http_client("Mozilla/5.0", Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    /// # Request Flow
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | URL does not parse | `Err` |
    /// | Connect failure, timeout, redirect loop | `NetworkError` |
    /// | Non-2xx status after redirects | `HttpError` |
    /// | Content-Type without `html` | `NotHtml` |
    /// | Body (or Content-Length) over the ceiling | `TooLarge` |
    /// | Otherwise | `Page` |
    async fn fetch(&self, url: &str, max_bytes: Option<u64>) -> Result<FetchOutcome, TrawlError> {
        let parsed = Url::parse(url)?;

        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(e) => return Ok(classify_error(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchOutcome::HttpError {
                status_code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.contains("html") {
            return Ok(FetchOutcome::NotHtml { content_type });
        }

        if let (Some(limit), Some(declared)) = (max_bytes, response.content_length()) {
            if declared > limit {
                return Ok(FetchOutcome::TooLarge { limit });
            }
        }

        let final_url = response.url().to_string();
        match read_body(response, max_bytes).await {
            Ok(Some(bytes)) => Ok(FetchOutcome::Page {
                final_url,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Ok(None) => Ok(FetchOutcome::TooLarge {
                limit: max_bytes.unwrap_or_default(),
            }),
            Err(e) => Ok(classify_error(&e)),
        }
    }
}

/// Reads the body chunk by chunk, returning `None` once it passes `max_bytes`
async fn read_body(
    mut response: Response,
    max_bytes: Option<u64>,
) -> Result<Option<Vec<u8>>, reqwest::Error> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if let Some(limit) = max_bytes {
            if body.len() as u64 > limit {
                return Ok(None);
            }
        }
    }

    Ok(Some(body))
}

fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };

    FetchOutcome::NetworkError { error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(build_http_client("TestCrawler/1.0", Duration::from_secs(5)).unwrap())
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestCrawler/1.0", Duration::from_secs(20)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(html("<a href=\"https://t.me/foo\">x</a>"))
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let outcome = fetcher().fetch(&url, Some(1024)).await.unwrap();

        match outcome {
            FetchOutcome::Page {
                final_url, body, ..
            } => {
                assert_eq!(final_url, url);
                assert!(body.contains("https://t.me/foo"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html("<p>moved</p>"))
            .mount(&server)
            .await;

        let outcome = fetcher()
            .fetch(&format!("{}/old", server.uri()), None)
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Page { final_url, .. } => assert!(final_url.ends_with("/new")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_non_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&server.uri(), None).await.unwrap();
        assert!(matches!(
            outcome,
            FetchOutcome::NotHtml { ref content_type } if content_type == "application/pdf"
        ));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html(&"a".repeat(4096)))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&server.uri(), Some(1000)).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::TooLarge { limit: 1000 }));
    }

    #[tokio::test]
    async fn test_fetch_without_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html(&"a".repeat(4096)))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&server.uri(), None).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Page { ref body, .. } if body.len() == 4096));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&server.uri(), None).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::HttpError { status_code: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_utf8_is_lossy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![b'<', b'p', b'>', 0xff, 0xfe], "text/html"),
            )
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&server.uri(), None).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Page { ref body, .. } if body.starts_with("<p>")));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop a listener so the port is known to be closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = fetcher()
            .fetch(&format!("http://{}/", addr), None)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::NetworkError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unparsable_url_is_err() {
        assert!(fetcher().fetch("not a url", None).await.is_err());
    }
}
