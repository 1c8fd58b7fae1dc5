//! Keyword search
//!
//! Seeds each cycle with result pages from an HTML search endpoint. The
//! default adapter posts the keyword to DuckDuckGo's HTML interface and reads
//! the result anchors.

use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// CSS selector for result links on the results page
const RESULT_LINK_SELECTOR: &str = "a.result__a";

/// Errors raised while querying the search endpoint
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search endpoint returned HTTP {0}")]
    Status(u16),
}

/// Source of seed URLs for a keyword
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns result URLs for `keyword`
    ///
    /// Failures are logged by the implementation and reported as an empty list.
    async fn search(&self, keyword: &str) -> Vec<String>;
}

/// DuckDuckGo HTML search adapter
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Posts the query and parses the first results page
    pub async fn query(&self, keyword: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", keyword)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(parse_results(&body))
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, keyword: &str) -> Vec<String> {
        tracing::info!("Searching for keyword '{}'", keyword);

        match self.query(keyword).await {
            Ok(urls) => {
                if urls.is_empty() {
                    tracing::warn!("No search results for '{}'", keyword);
                } else {
                    tracing::info!("Search for '{}' returned {} URLs", keyword, urls.len());
                }
                urls
            }
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", keyword, e);
                Vec::new()
            }
        }
    }
}

/// Extracts result URLs from a results page
///
/// Redirect wrappers of the form `//duckduckgo.com/l/?uddg=<target>` are
/// unwrapped. Only absolute http(s) URLs are kept, deduplicated in page order.
pub fn parse_results(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(RESULT_LINK_SELECTOR) else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for href in document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
    {
        match result_target(href) {
            Some(url) if !urls.contains(&url) => urls.push(url),
            Some(_) => {}
            None => tracing::debug!("Skipping search result href {}", href),
        }
    }

    urls
}

fn result_target(href: &str) -> Option<String> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    let url = if url.path() == "/l/" {
        let target = url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())?;
        Url::parse(&target).ok()?
    } else {
        url
    };

    if url.scheme() == "http" || url.scheme() == "https" {
        Some(url.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result__body">
            <a class="result__a" href="https://groups.example/list">Groups</a>
          </div>
          <div class="result__body">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdir.example%2Ftg%3Fp%3D1&amp;rut=abc">Dir</a>
          </div>
          <div class="result__body">
            <a class="result__a" href="https://groups.example/list">Duplicate</a>
            <a class="result__a" href="/relative">Relative</a>
            <a class="result__snippet" href="https://snippet.example/">Snippet</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_results() {
        assert_eq!(
            parse_results(RESULTS_PAGE),
            vec!["https://groups.example/list", "https://dir.example/tg?p=1"]
        );
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>No results.</body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_search_posts_keyword() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=telegram+channel+directory"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(RESULTS_PAGE, "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(Client::new(), format!("{}/html/", server.uri()));
        let urls = search.search("telegram channel directory").await;

        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_search_error_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(Client::new(), server.uri());
        assert!(matches!(
            search.query("kw").await,
            Err(SearchError::Status(503))
        ));
        assert!(search.search("kw").await.is_empty());
    }
}
