//! Link classification
//!
//! Splits the outbound links of one page into canonical target links and
//! same-site URLs worth queueing. Everything else is dropped.

use crate::config::TargetConfig;
use crate::url::{same_site, strip_fragment, TargetMatch, TargetMatcher};
use std::collections::HashSet;
use url::Url;

/// Links found on one page, deduplicated, in first-seen document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLinks {
    /// Canonical target links
    pub targets: Vec<String>,
    /// Same-site page URLs without fragments
    pub same_site: Vec<String>,
}

impl ClassifiedLinks {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.same_site.is_empty()
    }
}

/// Classifies outbound links relative to their source page
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    matcher: TargetMatcher,
}

impl LinkClassifier {
    pub fn new(config: &TargetConfig) -> Self {
        Self {
            matcher: TargetMatcher::new(config),
        }
    }

    /// Partitions `links` into target links and same-site candidates
    ///
    /// A link matching the target pattern is never reported as same-site,
    /// even when the page itself lives on a target host. Links that fail to
    /// parse or use a scheme other than http(s) are discarded.
    ///
    /// # Example
    ///
    /// ```
    /// use tele_trawl::config::TargetConfig;
    /// use tele_trawl::LinkClassifier;
    /// use url::Url;
    ///
    /// let classifier = LinkClassifier::new(&TargetConfig::default());
    /// let source = Url::parse("http://a.example/page").unwrap();
    /// let links = vec![
    ///     "https://t.me/foo/".to_string(),
    ///     "http://a.example/contact".to_string(),
    /// ];
    /// let result = classifier.classify(&source, &links);
    /// assert_eq!(result.targets, vec!["https://t.me/foo"]);
    /// assert_eq!(result.same_site, vec!["http://a.example/contact"]);
    /// ```
    pub fn classify(&self, source: &Url, links: &[String]) -> ClassifiedLinks {
        let mut result = ClassifiedLinks::default();
        let mut seen_targets = HashSet::new();
        let mut seen_same_site = HashSet::new();

        for link in links {
            let Ok(url) = Url::parse(link) else {
                tracing::trace!("Discarding unparsable link {}", link);
                continue;
            };

            if url.scheme() != "http" && url.scheme() != "https" {
                continue;
            }

            match self.matcher.match_url(&url) {
                TargetMatch::Target(canonical) => {
                    if seen_targets.insert(canonical.clone()) {
                        result.targets.push(canonical);
                    }
                }
                TargetMatch::Excluded(canonical) => {
                    tracing::trace!("Skipping preview link {}", canonical);
                }
                TargetMatch::NotTarget if same_site(source, &url) => {
                    let page = strip_fragment(&url).to_string();
                    if seen_same_site.insert(page.clone()) {
                        result.same_site.push(page);
                    }
                }
                TargetMatch::NotTarget => {}
            }
        }

        result
    }
}
