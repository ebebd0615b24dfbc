use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads the configuration, layering environment overrides on top
///
/// Without a path the built-in defaults are used as the base. The environment
/// variables `FORUM_URL`, `FORUM_ID`, `CSV_FILE`, `START_PAGE` and `END_PAGE`
/// override the corresponding settings.
///
/// # Arguments
///
/// * `path` - Optional path to a TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate(&config)?;

    Ok(config)
}

/// Applies environment overrides using the given variable lookup
///
/// Blank values are ignored, so `START_PAGE=` keeps the configured value.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = var("FORUM_URL") {
        config.forum.forum_url = url;
    }
    if let Some(id) = var("FORUM_ID") {
        config.forum.forum_id = id;
    }
    if let Some(csv) = var("CSV_FILE") {
        config.output.csv_file = Some(csv);
    }
    if let Some(value) = var("START_PAGE") {
        config.crawler.start_page = parse_page("START_PAGE", &value)?;
    }
    if let Some(value) = var("END_PAGE") {
        config.crawler.end_page = parse_page("END_PAGE", &value)?;
    }

    Ok(())
}

fn parse_page(name: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be told apart by their settings.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns it with the hash of its file, if any
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let config = load_config(path)?;
    let hash = path.map(compute_config_hash).transpose()?;
    Ok((config, hash))
}
