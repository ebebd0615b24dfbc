//! Forum-Harvester: a torrent listing crawler and download-link checker
//!
//! This crate crawls the listing pages of a torrent forum, turns every listed
//! topic into a CSV row with a content identifier, and separately probes a list
//! of download URLs for reachability. Output files are checkpointed into a git
//! remote as the run progresses.

pub mod checker;
pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod title;

use thiserror::Error;

/// Main error type for Forum-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to read URL list {path}: {source}")]
    InputList {
        path: String,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnv { name: String, value: String },
}

/// Errors raised while fetching a remote resource
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Network { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Whether the failure is worth another attempt at the transport level
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => crawler::is_retryable_status(*status),
            FetchError::Network { source, .. } => source.is_connect() || source.is_timeout(),
        }
    }
}

/// Result type alias for Forum-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use checker::{CheckResult, CheckSummary, ReachabilityChecker};
pub use checkpoint::{Checkpointer, CommitOutcome, GitCheckpointer};
pub use config::Config;
pub use crawler::{ContentLink, Coordinator, CrawlReport, ListingRecord, PageRange};
pub use title::TitleNormalizer;
