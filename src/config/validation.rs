use crate::config::types::{Config, CrawlerConfig, DownloadConfig, MediaConfig, UserAgentConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_download_config(&config.download)?;
    validate_media_config(&config.media)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.base_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "base_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Lowercases extensions and gives them a leading dot, dropping blanks
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.retry_count < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_count must be >= 1, got {}",
            config.retry_count
        )));
    }

    for (name, value) in [
        ("max_size_mb", config.max_size_mb),
        ("video_max_size_mb", config.video_max_size_mb),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a positive number, got {}",
                name, value
            )));
        }
    }

    if config.timeout_secs == 0 || config.video_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "download timeouts must be >= 1 second".to_string(),
        ));
    }

    if let Some(extensions) = &config.allowed_extensions {
        if extensions.is_empty() {
            return Err(ConfigError::Validation(
                "allowed_extensions cannot be an empty list; omit it to allow all".to_string(),
            ));
        }
        validate_extension_list("allowed_extensions", extensions)?;
    }

    Ok(())
}

/// Validates media classification configuration
fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    if config.vector_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "vector_extensions cannot be empty".to_string(),
        ));
    }
    validate_extension_list("vector_extensions", &config.vector_extensions)
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "user agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    Ok(())
}

/// Checks that each extension is a dot followed by alphanumerics
fn validate_extension_list(field: &str, extensions: &[String]) -> Result<(), ConfigError> {
    for ext in extensions {
        let body = ext.strip_prefix('.').unwrap_or(ext);
        if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "{} contains an invalid extension '{}'",
                field, ext
            )));
        }
    }
    Ok(())
}
