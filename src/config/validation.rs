use crate::config::types::{BrowserConfig, Config, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_browser_config(&config.browser)?;
    Ok(())
}

/// Validates retry budgets
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("item-attempts", config.item_attempts),
        ("listing-attempts", config.listing_attempts),
        ("expand-attempts", config.expand_attempts),
        ("pagination-attempts", config.pagination_attempts),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.item_short_delay_threshold > config.item_attempts {
        return Err(ConfigError::Validation(format!(
            "item-short-delay-threshold ({}) cannot exceed item-attempts ({})",
            config.item_short_delay_threshold, config.item_attempts
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.collect_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "collect-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.entry_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid entry-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "entry-url '{}' must use http or https",
            config.entry_url
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}
