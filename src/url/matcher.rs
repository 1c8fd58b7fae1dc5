use crate::config::TargetConfig;
use crate::url::domain::{extract_domain, strip_www};
use crate::url::normalize::identifier_path;
use url::Url;

/// Outcome of matching one URL against the target pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMatch {
    /// A target link, in canonical form
    Target(String),
    /// A target host with an excluded preview segment
    Excluded(String),
    /// Not a target link
    NotTarget,
}

/// Recognizes target links and rebuilds them on one canonical base
///
/// A URL is a target link when its scheme is http or https, its host (without
/// a leading `www.`) is one of the configured target hosts, and its path starts
/// with a non-empty identifier. Every variant of the same identifier collapses
/// to `{canonical_base}/{identifier}`.
#[derive(Debug, Clone)]
pub struct TargetMatcher {
    hosts: Vec<String>,
    canonical_base: String,
    excluded: Vec<String>,
}

impl TargetMatcher {
    pub fn new(config: &TargetConfig) -> Self {
        Self {
            hosts: config
                .hosts
                .iter()
                .map(|h| strip_www(&h.to_lowercase()).to_string())
                .collect(),
            canonical_base: config.canonical_base.trim_end_matches('/').to_string(),
            excluded: config
                .excluded_segments
                .iter()
                .map(|s| format!("/{}/", s))
                .collect(),
        }
    }

    /// Returns true if the URL's host is a target host
    pub fn is_target_host(&self, url: &Url) -> bool {
        extract_domain(url)
            .map(|host| self.hosts.iter().any(|h| h == strip_www(&host)))
            .unwrap_or(false)
    }

    /// Matches a URL against the target pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use tele_trawl::config::TargetConfig;
    /// use tele_trawl::url::{TargetMatch, TargetMatcher};
    /// use url::Url;
    ///
    /// let matcher = TargetMatcher::new(&TargetConfig::default());
    /// let url = Url::parse("http://www.telegram.me/rustlang/").unwrap();
    /// assert_eq!(
    ///     matcher.match_url(&url),
    ///     TargetMatch::Target("https://t.me/rustlang".to_string())
    /// );
    /// ```
    pub fn match_url(&self, url: &Url) -> TargetMatch {
        if url.scheme() != "http" && url.scheme() != "https" {
            return TargetMatch::NotTarget;
        }

        if !self.is_target_host(url) {
            return TargetMatch::NotTarget;
        }

        let Some(identifier) = identifier_path(url.path()) else {
            return TargetMatch::NotTarget;
        };

        let canonical = format!("{}/{}", self.canonical_base, identifier);
        if self.excluded.iter().any(|segment| canonical.contains(segment)) {
            TargetMatch::Excluded(canonical)
        } else {
            TargetMatch::Target(canonical)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> TargetMatcher {
        TargetMatcher::new(&TargetConfig::default())
    }

    fn match_str(url: &str) -> TargetMatch {
        matcher().match_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_plain_target() {
        assert_eq!(
            match_str("https://t.me/foo"),
            TargetMatch::Target("https://t.me/foo".to_string())
        );
    }

    #[test]
    fn test_trailing_slash_stripped() {
        assert_eq!(
            match_str("https://t.me/foo/"),
            TargetMatch::Target("https://t.me/foo".to_string())
        );
    }

    #[test]
    fn test_host_variants_collapse() {
        for url in [
            "http://t.me/foo",
            "https://www.t.me/foo",
            "https://telegram.me/foo",
            "http://www.telegram.me/foo/",
            "https://T.ME/foo",
        ] {
            assert_eq!(
                match_str(url),
                TargetMatch::Target("https://t.me/foo".to_string()),
                "{} should collapse",
                url
            );
        }
    }

    #[test]
    fn test_query_and_fragment_dropped() {
        assert_eq!(
            match_str("https://t.me/foo?start=1#x"),
            TargetMatch::Target("https://t.me/foo".to_string())
        );
    }

    #[test]
    fn test_preview_links_excluded() {
        assert_eq!(
            match_str("https://t.me/foo/s/1"),
            TargetMatch::Excluded("https://t.me/foo/s/1".to_string())
        );
        assert_eq!(
            match_str("https://t.me/s/foo"),
            TargetMatch::Excluded("https://t.me/s/foo".to_string())
        );
    }

    #[test]
    fn test_bare_s_identifier_is_kept() {
        assert_eq!(
            match_str("https://t.me/s"),
            TargetMatch::Target("https://t.me/s".to_string())
        );
    }

    #[test]
    fn test_empty_path_is_not_target() {
        assert_eq!(match_str("https://t.me/"), TargetMatch::NotTarget);
        assert_eq!(match_str("https://t.me/+AbCd"), TargetMatch::NotTarget);
    }

    #[test]
    fn test_other_hosts_are_not_targets() {
        assert_eq!(match_str("https://example.com/foo"), TargetMatch::NotTarget);
        assert_eq!(match_str("https://sub.t.me/foo"), TargetMatch::NotTarget);
        assert_eq!(match_str("https://t.me.evil.com/foo"), TargetMatch::NotTarget);
    }

    #[test]
    fn test_non_http_scheme_is_not_target() {
        assert_eq!(match_str("tg://resolve?domain=foo"), TargetMatch::NotTarget);
        assert_eq!(match_str("ftp://t.me/foo"), TargetMatch::NotTarget);
    }

    #[test]
    fn test_custom_canonical_base() {
        let config = TargetConfig {
            hosts: vec!["t.me".to_string()],
            canonical_base: "https://telegram.me/".to_string(),
            excluded_segments: vec![],
        };
        let matcher = TargetMatcher::new(&config);
        let url = Url::parse("https://t.me/foo/s/1").unwrap();
        assert_eq!(
            matcher.match_url(&url),
            TargetMatch::Target("https://telegram.me/foo/s/1".to_string())
        );
    }
}
