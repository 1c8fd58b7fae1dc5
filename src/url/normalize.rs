use crate::UrlError;
use url::Url;

/// Parses a crawlable page URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host
/// 4. Remove the fragment
///
/// # Examples
///
/// ```
/// use tele_trawl::url::normalize_url;
///
/// let url = normalize_url("https://example.com/groups#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/groups");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(strip_fragment(&url))
}

/// Returns a copy of the URL without its fragment
pub fn strip_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Extracts the leading identifier path of a target link
///
/// Takes the longest prefix of the path made of word characters and `/`,
/// with leading and trailing slashes removed. Returns `None` if nothing is
/// left, so `https://t.me/` and `https://t.me/+invite` carry no identifier.
///
/// ```
/// use tele_trawl::url::identifier_path;
///
/// assert_eq!(identifier_path("/foo/"), Some("foo".to_string()));
/// assert_eq!(identifier_path("/joinchat/AbC_1?x"), Some("joinchat/AbC_1".to_string()));
/// assert_eq!(identifier_path("/"), None);
/// ```
pub fn identifier_path(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    let end = path
        .char_indices()
        .find(|(_, c)| !is_identifier_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(path.len());

    let identifier = path[..end].trim_end_matches('/');
    if identifier.is_empty() {
        None
    } else {
        Some(identifier.to_string())
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}
