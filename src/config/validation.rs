use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, QueueConfig, ServerConfig, StorageConfig,
    UserAgentConfig, WorkerConfig,
};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_crawler_config(&config.crawler)?;
    validate_queue_config(&config.queue)?;
    validate_worker_config(&config.worker)?;
    validate_cache_config(&config.cache)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates crawler limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_fetches < 1 {
        return Err(ConfigError::Validation(format!(
            "max_fetches must be >= 1, got {}",
            config.max_fetches
        )));
    }

    if config.max_sitemaps < 1 {
        return Err(ConfigError::Validation(format!(
            "max_sitemaps must be >= 1, got {}",
            config.max_sitemaps
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 120, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_secs < 1 {
        return Err(ConfigError::Validation(
            "backoff_base_secs must be >= 1".to_string(),
        ));
    }

    if config.backoff_max_secs < config.backoff_base_secs {
        return Err(ConfigError::Validation(format!(
            "backoff_max_secs ({}) must be >= backoff_base_secs ({})",
            config.backoff_max_secs, config.backoff_base_secs
        )));
    }

    // Jitter must stay below the doubling step so delays keep increasing
    if !(0.0..1.0).contains(&config.jitter_ratio) {
        return Err(ConfigError::Validation(format!(
            "jitter_ratio must be in [0.0, 1.0), got {}",
            config.jitter_ratio
        )));
    }

    if config.stale_claim_minutes < 1 {
        return Err(ConfigError::Validation(format!(
            "stale_claim_minutes must be >= 1, got {}",
            config.stale_claim_minutes
        )));
    }

    Ok(())
}

fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.freshness_window_days < 1 {
        return Err(ConfigError::Validation(format!(
            "freshness_window_days must be >= 1, got {}",
            config.freshness_window_days
        )));
    }
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid bind_address '{}': {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
