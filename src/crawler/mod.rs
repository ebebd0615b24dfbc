//! Crawler module for forum listing pages
//!
//! This module contains the page crawl pipeline, including:
//! - HTTP fetching with retry logic
//! - Listing page parsing and pagination discovery
//! - Topic id extraction and content link resolution
//! - Overall crawl coordination across a bounded worker pool

mod coordinator;
mod fetcher;
mod parser;
mod resolver;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, is_retryable_status, Fetcher, RequestProfile, RetryPolicy};
pub use parser::{page_url, parse_listing_page, parse_max_page, RawRow, UNKNOWN_PUBLISHER};
pub use resolver::{build_torrent_url, extract_topic_id, ContentLink, LinkResolver};

/// One listed topic, as written to the CSV table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    /// Listing page the topic was found on
    pub page: u32,

    /// Cleaned title
    pub title: String,

    /// Absolute topic URL
    pub topic_url: String,

    pub publisher: String,

    pub link: ContentLink,
}

/// Pages to crawl, walked from `start` down to `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Start value that asks for the last page to be discovered
    pub const DISCOVER: u32 = 0;

    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether the start page must be discovered from the forum
    pub fn needs_discovery(&self) -> bool {
        self.start == Self::DISCOVER
    }

    /// Pages in crawl order, highest first
    pub fn pages(&self) -> Vec<u32> {
        (self.end.max(1)..=self.start).rev().collect()
    }
}
