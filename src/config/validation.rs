use crate::config::types::{
    Config, CrawlerConfig, FrontierConfig, OutputConfig, OutputFormat, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on worker concurrency
const MAX_CONCURRENCY: u32 = 256;

/// Validates the entire configuration
///
/// Every check here is fatal: a configuration that fails validation is
/// reported before any URL is fetched.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_frontier_config(&config.frontier)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the seed URL set
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if config.name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "user-agent name must not contain whitespace, got '{}'",
            config.name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates membership filter sizing
fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    if config.expected_urls < 1 {
        return Err(ConfigError::Validation(
            "expected_urls must be >= 1".to_string(),
        ));
    }

    if !(config.false_positive_rate > 0.0 && config.false_positive_rate < 1.0) {
        return Err(ConfigError::Validation(format!(
            "false_positive_rate must be in (0, 1), got {}",
            config.false_positive_rate
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.format {
        OutputFormat::Json if config.directory.is_empty() => Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        )),
        OutputFormat::Sqlite if config.database_path.is_empty() => Err(
            ConfigError::Validation("database_path cannot be empty".to_string()),
        ),
        _ => Ok(()),
    }
}
