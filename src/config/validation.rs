use crate::config::types::{Config, CrawlConfig, NotifierConfig, SearchConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_crawl_config(&config.crawl)?;
    validate_target_config(&config.targets)?;
    validate_notifier_config(&config.notifier)?;

    if config.user_agent.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    if config.storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed keywords
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if let Some(position) = config.keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "keyword #{} is empty",
            position + 1
        )));
    }

    let endpoint = Url::parse(&config.endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid search endpoint '{}': {}", config.endpoint, e))
    })?;
    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "search endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    Ok(())
}

/// Validates crawl limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.queue_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_batch_size must be >= 1, got {}",
            config.queue_batch_size
        )));
    }

    if config.request_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 1000ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    Ok(())
}

/// Validates the target link description
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.hosts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one target host is required".to_string(),
        ));
    }

    for host in &config.hosts {
        validate_host_string(host)?;
    }

    let base = Url::parse(&config.canonical_base).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid canonical_base '{}': {}",
            config.canonical_base, e
        ))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "canonical_base '{}' must use http or https",
            config.canonical_base
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "canonical_base '{}' has no host",
            config.canonical_base
        )));
    }

    for segment in &config.excluded_segments {
        if segment.is_empty() || segment.contains('/') {
            return Err(ConfigError::Validation(format!(
                "excluded segment '{}' must be a single non-empty path segment",
                segment
            )));
        }
    }

    Ok(())
}

/// Validates notifier settings
///
/// Missing credentials are not an error here: the notifier is then simply
/// unusable and startup logs a warning.
fn validate_notifier_config(config: &NotifierConfig) -> Result<(), ConfigError> {
    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "notifier queue_capacity must be >= 1".to_string(),
        ));
    }

    Url::parse(&config.api_base).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid api_base '{}': {}", config.api_base, e))
    })?;

    Ok(())
}

/// Validates a host string such as `t.me`
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must contain at least one dot (e.g., 't.me')",
            host
        )));
    }

    Ok(())
}
