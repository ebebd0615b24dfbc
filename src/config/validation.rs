use crate::config::types::{
    CheckerConfig, CheckpointConfig, Config, CrawlerConfig, ForumConfig, HttpConfig, TitleConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forum_config(&config.forum)?;
    validate_http_config(&config.http)?;
    validate_crawler_config(&config.crawler)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_checker_config(&config.checker)?;
    validate_title_config(&config.titles)?;

    if config.csv_path().trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates forum location settings
fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    validate_http_url("forum_url", &config.forum_url)?;
    validate_http_url("download_base_url", &config.download_base_url)?;

    if let Some(warm_up) = &config.warm_up_url {
        validate_http_url("warm_up_url", warm_up)?;
    }

    if config.forum_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "forum_id cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates transport settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // start_page == 0 is the "discover the last page" sentinel
    if config.end_page < 1 {
        return Err(ConfigError::Validation(format!(
            "end_page must be >= 1, got {}",
            config.end_page
        )));
    }

    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.page_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "page_retries must be <= 10, got {}",
            config.page_retries
        )));
    }

    if config.min_pace_ms > config.max_pace_ms {
        return Err(ConfigError::Validation(format!(
            "min_pace_ms ({}) cannot exceed max_pace_ms ({})",
            config.min_pace_ms, config.max_pace_ms
        )));
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.commit_interval < 1 {
        return Err(ConfigError::Validation(
            "checkpoint commit_interval must be >= 1".to_string(),
        ));
    }

    if config.repo_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "repo_dir cannot be empty".to_string(),
        ));
    }

    if config.branch.is_some() && config.remote.is_none() {
        return Err(ConfigError::Validation(
            "branch requires a remote to push to".to_string(),
        ));
    }

    Ok(())
}

/// Validates reachability checker configuration
fn validate_checker_config(config: &CheckerConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("input_file", &config.input_file),
        ("ok_file", &config.ok_file),
        ("error_file", &config.error_file),
    ] {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.ok_file == config.error_file {
        return Err(ConfigError::Validation(format!(
            "ok_file and error_file must differ, both are '{}'",
            config.ok_file
        )));
    }

    if config.batch_size < 1 || config.batch_size > 100 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 100, got {}",
            config.batch_size
        )));
    }

    if config.write_batch_size < 1 {
        return Err(ConfigError::Validation(
            "write_batch_size must be >= 1".to_string(),
        ));
    }

    if config.commit_interval < 1 {
        return Err(ConfigError::Validation(
            "checker commit_interval must be >= 1".to_string(),
        ));
    }

    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "checker timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates title cleaning configuration
fn validate_title_config(config: &TitleConfig) -> Result<(), ConfigError> {
    if config.known_tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "known_tags cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates an absolute http(s) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
