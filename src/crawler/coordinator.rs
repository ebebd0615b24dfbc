//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the page crawl, including:
//! - Resolving the page range, discovering the last page when asked to
//! - Dispatching page work across a bounded pool of tasks
//! - Appending finished pages to the CSV table in completion order
//! - Issuing checkpoint commits as records accumulate
//! - Pacing result handling with a jittered delay

use crate::checkpoint::{self, Checkpointer};
use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, RequestProfile, RetryPolicy};
use crate::crawler::parser::{page_url, parse_listing_page, parse_max_page, RawRow};
use crate::crawler::resolver::LinkResolver;
use crate::crawler::{ListingRecord, PageRange};
use crate::output::ListingTable;
use crate::state::CheckpointCounter;
use crate::title::TitleNormalizer;
use crate::HarvestError;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Totals of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Highest page crawled (after discovery)
    pub start_page: u32,

    /// Lowest page crawled
    pub end_page: u32,

    /// Pages handed to workers
    pub pages_dispatched: usize,

    /// Pages that contributed at least one record
    pub pages_with_records: usize,

    /// Pages whose fetch failed on every attempt
    pub pages_failed: usize,

    /// Records appended to the table
    pub records_written: usize,

    /// Checkpoint calls issued
    pub checkpoints: usize,
}

/// Result of one page task
#[derive(Debug)]
struct PageOutcome {
    page: u32,
    records: Vec<ListingRecord>,
    fetch_failed: bool,
}

/// Everything a page task needs; shared read-only between tasks
struct PageWorker {
    fetcher: Fetcher,
    resolver: LinkResolver,
    normalizer: TitleNormalizer,
    base_url: Url,
    page_retry: RetryPolicy,
}

impl PageWorker {
    /// Fetches, parses and resolves one listing page
    ///
    /// The page fetch is retried with exponential backoff. A page that fails
    /// every attempt yields no records instead of an error.
    async fn crawl_page(&self, page: u32) -> PageOutcome {
        let url = page_url(self.base_url.as_str(), page);
        let retries = self.page_retry.max_attempts - 1;
        let mut attempt = 0;

        loop {
            tracing::info!("Crawling page {}: {}", page, url);

            match self.fetcher.get_text(&url, RequestProfile::Page).await {
                Ok(html) => {
                    let rows = parse_listing_page(&html, page, &self.base_url);
                    let records = self.build_records(page, rows).await;
                    tracing::info!("Page {}: found {} records", page, records.len());
                    return PageOutcome {
                        page,
                        records,
                        fetch_failed: false,
                    };
                }
                Err(e) if attempt < retries => {
                    let delay = self.page_retry.delay_for(attempt);
                    tracing::warn!(
                        "Page {} retry {}/{}, waiting {:?}: {}",
                        page,
                        attempt + 1,
                        retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Page {} failed after {} attempts: {}",
                        page,
                        attempt + 1,
                        e
                    );
                    return PageOutcome {
                        page,
                        records: Vec::new(),
                        fetch_failed: true,
                    };
                }
            }
        }
    }

    async fn build_records(&self, page: u32, rows: Vec<RawRow>) -> Vec<ListingRecord> {
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let title = self.normalizer.clean(&row.raw_title);
            let link = self.resolver.resolve(row.topic_id.as_deref()).await;

            tracing::debug!("Page {} added record: {}", page, title);
            records.push(ListingRecord {
                page,
                title,
                topic_url: row.topic_url,
                publisher: row.publisher,
                link,
            });
        }

        let derived = records.iter().filter(|r| r.link.is_derived()).count();
        tracing::debug!(
            "Page {}: derived {} of {} content ids",
            page,
            derived,
            records.len()
        );

        records
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    worker: Arc<PageWorker>,
    table: ListingTable,
    checkpointer: Arc<dyn Checkpointer>,
    counter: CheckpointCounter,
    warm_up_url: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `checkpointer` - Where checkpoint commits go
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The forum URL is invalid or the HTTP client failed to build
    pub fn new(config: Config, checkpointer: Arc<dyn Checkpointer>) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&config.forum.base_url())?;
        let origin = format!("{}/", base_url.origin().ascii_serialization());

        let fetcher = Fetcher::new(&config.http, Some(origin.as_str()))?;
        let resolver = LinkResolver::new(fetcher.clone(), config.forum.download_base_url.clone());
        let page_retry = RetryPolicy::new(
            config.crawler.page_retries + 1,
            Duration::from_millis(config.crawler.page_retry_delay_ms),
        );

        let worker = PageWorker {
            fetcher,
            resolver,
            normalizer: TitleNormalizer::new(&config.titles),
            base_url,
            page_retry,
        };

        let warm_up_url = config.forum.warm_up_url.clone().unwrap_or(origin);

        Ok(Self {
            table: ListingTable::new(config.csv_path()),
            counter: CheckpointCounter::new(config.checkpoint.commit_interval),
            worker: Arc::new(worker),
            config: Arc::new(config),
            checkpointer,
            warm_up_url,
        })
    }

    pub fn table(&self) -> &ListingTable {
        &self.table
    }

    /// Runs the crawl over the configured page range
    ///
    /// This is the core crawling logic that:
    /// 1. Prepares the repository for the table (fatal on failure)
    /// 2. Resolves the page range, rewriting the table when discovering
    /// 3. Spawns one task per page, at most `max_workers` running at once
    /// 4. Appends each finished page to the table in completion order
    /// 5. Checkpoints every `commit_interval` records and once at the end
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let started = Instant::now();
        let files = self.checkpoint_files();

        self.checkpointer.prepare(&files).await?;
        self.worker.fetcher.warm_up(&self.warm_up_url).await;

        let range = self.resolve_range().await?;
        tracing::info!("Crawling pages {} down to {}", range.start, range.end);

        let pages = range.pages();
        if pages.is_empty() {
            tracing::warn!(
                "End page {} is above start page {}, nothing to crawl",
                range.end,
                range.start
            );
        }

        let mut report = CrawlReport {
            start_page: range.start,
            end_page: range.end,
            pages_dispatched: pages.len(),
            ..CrawlReport::default()
        };

        let progress = self.progress_bar(report.pages_dispatched);
        let mut tasks = self.dispatch(pages);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => self.collect(outcome, &mut report).await?,
                Err(e) => tracing::error!("Page task ended abnormally: {}", e),
            }
            progress.inc(1);

            tokio::time::sleep(self.pace_delay()).await;
        }
        progress.finish_and_clear();

        if self.counter.has_pending() {
            let pending = self.counter.pending();
            tracing::info!("Final checkpoint for remaining {} records", pending);
            self.checkpoint(
                format!("Final update of remaining {} records", pending),
                &mut report,
            )
            .await?;
        }

        let stats = self.table.stats()?;
        tracing::info!(
            "Final CSV state: {}, size: {} bytes, lines: {}",
            self.table.path().display(),
            stats.size_bytes,
            stats.line_count
        );
        tracing::info!(
            "Crawl finished: {} records from {} pages ({} failed) in {:?}",
            report.records_written,
            report.pages_dispatched,
            report.pages_failed,
            started.elapsed()
        );

        Ok(report)
    }

    /// Finds the highest page number from the forum's pagination bar
    ///
    /// Falls back to 1 when the first page cannot be fetched.
    pub async fn discover_max_page(&self) -> u32 {
        let base = self.worker.base_url.as_str();
        tracing::info!("Discovering last page from {}", base);

        match self.worker.fetcher.get_text(base, RequestProfile::Page).await {
            Ok(html) => {
                let max_page = parse_max_page(&html);
                tracing::info!("Last page is {}", max_page);
                max_page
            }
            Err(e) => {
                tracing::error!("Failed to discover last page: {}", e);
                tracing::warn!("Defaulting to page 1");
                1
            }
        }
    }

    async fn resolve_range(&self) -> Result<PageRange, HarvestError> {
        let mut range = PageRange::new(
            self.config.crawler.start_page,
            self.config.crawler.end_page,
        );

        if range.needs_discovery() {
            tracing::info!("Start page is 0, clearing the table and discovering the last page");
            self.table.reset()?;
            range.start = self.discover_max_page().await;
            tracing::info!("Start page set to {}", range.start);
        }

        self.table.ensure()?;
        Ok(range)
    }

    fn dispatch(&self, pages: Vec<u32>) -> JoinSet<PageOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.crawler.max_workers));
        let mut tasks = JoinSet::new();

        tracing::debug!("Dispatching pages: {:?}", pages);
        for page in pages {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed, so the permit is always granted
                let _permit = semaphore.acquire_owned().await.ok();
                worker.crawl_page(page).await
            });
        }

        tasks
    }

    /// Writes a finished page and checkpoints when enough records piled up
    ///
    /// A table write failure is logged and the page is dropped; checkpoint
    /// failures propagate.
    async fn collect(
        &mut self,
        outcome: PageOutcome,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        let page = outcome.page;
        if outcome.fetch_failed {
            report.pages_failed += 1;
        }
        tracing::debug!("Page {} returned {} records", page, outcome.records.len());

        if outcome.records.is_empty() {
            tracing::warn!("Page {}: no records to write", page);
        } else {
            match self.table.append(&outcome.records) {
                Ok(written) => {
                    report.records_written += written;
                    report.pages_with_records += 1;
                    self.counter.record(written);
                    tracing::info!(
                        "Page {}: wrote {} records to {}",
                        page,
                        written,
                        self.table.path().display()
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to write page {} to the table: {}", page, e);
                    return Ok(());
                }
            }
        }

        tracing::debug!("Records since last checkpoint: {}", self.counter.pending());
        if self.counter.is_due() {
            tracing::info!(
                "Reached checkpoint interval {}, committing",
                self.counter.interval()
            );
            let message = format!(
                "Update {} records through page {}",
                self.counter.pending(),
                page
            );
            self.checkpoint(message, report).await?;
        }

        Ok(())
    }

    async fn checkpoint(
        &mut self,
        message: String,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        let files = self.checkpoint_files();
        checkpoint::checkpoint(self.checkpointer.as_ref(), &files, &message).await?;
        self.counter.reset();
        report.checkpoints += 1;
        Ok(())
    }

    fn checkpoint_files(&self) -> Vec<PathBuf> {
        vec![self.table.path().to_path_buf()]
    }

    fn progress_bar(&self, pages: usize) -> ProgressBar {
        if !self.config.crawler.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(pages as u64);
        let template = "Crawling pages [{bar:40}] {pos}/{len} {elapsed}";
        match ProgressStyle::default_bar().template(template) {
            Ok(style) => bar.set_style(style),
            Err(e) => tracing::debug!("Keeping default progress style: {}", e),
        }
        bar
    }

    /// Random pause between handled pages
    fn pace_delay(&self) -> Duration {
        let min = self.config.crawler.min_pace_ms;
        let max = self.config.crawler.max_pace_ms.max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Runs a complete page crawl with the checkpointer the configuration asks for
///
/// # Example
///
/// ```no_run
/// use forum_harvester::config::load_config;
/// use forum_harvester::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(None)?;
/// let report = run_crawl(config).await?;
/// println!("{} records written", report.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, HarvestError> {
    let checkpointer = checkpoint::from_config(&config.checkpoint);
    let mut coordinator = Coordinator::new(config, checkpointer)?;
    coordinator.run().await
}
