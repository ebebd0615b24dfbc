use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Main configuration structure for Forum-Harvester
///
/// Every section is optional in the TOML file; missing keys take the defaults
/// below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forum: ForumConfig,
    pub http: HttpConfig,
    pub crawler: CrawlerConfig,
    pub checkpoint: CheckpointConfig,
    pub checker: CheckerConfig,
    pub output: OutputConfig,
    pub titles: TitleConfig,
}

/// Forum location and download endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Listing URL of the forum section (page 1)
    #[serde(rename = "forum-url")]
    pub forum_url: String,

    /// Numeric forum id, used to name the CSV table
    #[serde(rename = "forum-id")]
    pub forum_id: String,

    /// Prefix that `<topic id>.torrent` is appended to
    #[serde(rename = "download-base-url")]
    pub download_base_url: String,

    /// Fetched once before crawling to pick up session cookies
    #[serde(rename = "warm-up-url")]
    pub warm_up_url: Option<String>,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            forum_url: "https://pornotorrent.top/forum-1670/".to_string(),
            forum_id: "1670".to_string(),
            download_base_url: "https://files.cdntraffic.top/PL/torrent/files/".to_string(),
            warm_up_url: None,
        }
    }
}

impl ForumConfig {
    /// The forum URL with exactly one trailing slash
    pub fn base_url(&self) -> String {
        format!("{}/", self.forum_url.trim_end_matches('/'))
    }
}

/// Transport-level request settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for page and torrent GETs (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts for a GET hitting a transient failure
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff between attempts (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

/// Page crawl behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// First page to crawl; 0 discovers the last page and rewrites the table
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Last page to crawl (inclusive, crawled in descending order)
    #[serde(rename = "end-page")]
    pub end_page: u32,

    /// Number of pages fetched concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Extra attempts for a whole page after the first one fails
    #[serde(rename = "page-retries")]
    pub page_retries: u32,

    /// Base of the exponential backoff between page attempts (milliseconds)
    #[serde(rename = "page-retry-delay-ms")]
    pub page_retry_delay_ms: u64,

    /// Lower bound of the pause after each completed page (milliseconds)
    #[serde(rename = "min-pace-ms")]
    pub min_pace_ms: u64,

    /// Upper bound of the pause after each completed page (milliseconds)
    #[serde(rename = "max-pace-ms")]
    pub max_pace_ms: u64,

    /// Draw a progress bar over the dispatched pages
    #[serde(rename = "show-progress")]
    pub show_progress: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_page: 283,
            end_page: 1,
            max_workers: 5,
            page_retries: 3,
            page_retry_delay_ms: 500,
            min_pace_ms: 500,
            max_pace_ms: 1500,
            show_progress: true,
        }
    }
}

/// Git checkpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// When false, checkpoints are logged but nothing is committed
    pub enabled: bool,

    /// Records written between crawl checkpoints
    #[serde(rename = "commit-interval")]
    pub commit_interval: usize,

    /// Register output files with `git lfs track` before the run
    #[serde(rename = "lfs-track")]
    pub lfs_track: bool,

    /// Working tree the git commands run in
    #[serde(rename = "repo-dir")]
    pub repo_dir: String,

    pub remote: Option<String>,

    pub branch: Option<String>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            commit_interval: 500,
            lfs_track: true,
            repo_dir: ".".to_string(),
            remote: None,
            branch: None,
        }
    }
}

/// URL reachability checker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    #[serde(rename = "input-file")]
    pub input_file: String,

    #[serde(rename = "ok-file")]
    pub ok_file: String,

    #[serde(rename = "error-file")]
    pub error_file: String,

    /// URLs probed concurrently per batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Buffered results that trigger a write to the logs
    #[serde(rename = "write-batch-size")]
    pub write_batch_size: usize,

    /// URLs processed between checkpoints
    #[serde(rename = "commit-interval")]
    pub commit_interval: usize,

    /// HEAD request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            input_file: "torrent_error.txt".to_string(),
            ok_file: "torrent_check_ok.txt".to_string(),
            error_file: "torrent_check_error.txt".to_string(),
            batch_size: 10,
            write_batch_size: 100,
            commit_interval: 100,
            timeout_ms: 5000,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV table path; defaults to `<forum-id>.csv`
    #[serde(rename = "csv-file")]
    pub csv_file: Option<String>,
}

/// Title cleaning settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Segments up to this many characters are checked against `known-tags`
    #[serde(rename = "short-tag-max-len")]
    pub short_tag_max_len: usize,

    /// Quality/format tags that never count as a title
    #[serde(rename = "known-tags")]
    pub known_tags: Vec<String>,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            short_tag_max_len: 3,
            known_tags: vec!["ART".to_string(), "720p".to_string(), "1080p".to_string()],
        }
    }
}

impl Config {
    /// Path of the CSV table for the configured forum
    pub fn csv_path(&self) -> String {
        self.output
            .csv_file
            .clone()
            .unwrap_or_else(|| format!("{}.csv", self.forum.forum_id))
    }
}
