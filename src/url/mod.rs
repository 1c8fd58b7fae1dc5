//! URL handling module for Tele-Trawl
//!
//! This module provides page URL normalization, host comparison, and the
//! target-link matcher that canonicalizes Telegram links.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, same_site, strip_www};
pub use matcher::{TargetMatch, TargetMatcher};
pub use normalize::{identifier_path, normalize_url, strip_fragment};
