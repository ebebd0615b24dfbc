use crate::checker::{CheckResult, CheckSummary};
use crate::checkpoint::{self, Checkpointer};
use crate::config::{CheckerConfig, Config};
use crate::crawler::Fetcher;
use crate::output::ReachabilityLogs;
use crate::state::CheckpointCounter;
use crate::HarvestError;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reads a newline-delimited URL list, skipping blank lines
pub fn read_url_list(path: &Path) -> Result<Vec<String>, HarvestError> {
    let content = std::fs::read_to_string(path).map_err(|source| HarvestError::InputList {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Probes download URLs in concurrent batches and logs the results
///
/// Batches run one after another; the URLs inside a batch are probed
/// concurrently on the calling task. Results are buffered and appended to the
/// logs once `write_batch_size` of them have piled up.
pub struct ReachabilityChecker {
    config: CheckerConfig,
    fetcher: Fetcher,
    logs: ReachabilityLogs,
    checkpointer: Arc<dyn Checkpointer>,
    counter: CheckpointCounter,
}

impl ReachabilityChecker {
    pub fn new(config: &Config, checkpointer: Arc<dyn Checkpointer>) -> Result<Self, HarvestError> {
        let checker = config.checker.clone();

        Ok(Self {
            fetcher: Fetcher::new(&config.http, None)?,
            logs: ReachabilityLogs::new(&checker.ok_file, &checker.error_file),
            counter: CheckpointCounter::new(checker.commit_interval),
            config: checker,
            checkpointer,
        })
    }

    pub fn logs(&self) -> &ReachabilityLogs {
        &self.logs
    }

    /// Checks every URL in the configured input file
    pub async fn run(&mut self) -> Result<CheckSummary, HarvestError> {
        let input = self.config.input_file.clone();
        tracing::info!("Checking URLs from {}", input);

        let urls = read_url_list(Path::new(&input))?;
        tracing::info!("Read {} URLs", urls.len());

        self.check_urls(&urls).await
    }

    /// Checks the given URLs, resetting both logs first
    pub async fn check_urls(&mut self, urls: &[String]) -> Result<CheckSummary, HarvestError> {
        let started = Instant::now();

        self.logs.reset()?;
        self.checkpointer.prepare(&self.logs.paths()).await?;

        let mut summary = CheckSummary {
            total: urls.len(),
            ..CheckSummary::default()
        };
        let mut ok = Vec::new();
        let mut errors = Vec::new();

        for batch in urls.chunks(self.config.batch_size.max(1)) {
            for result in self.check_batch(batch).await {
                tracing::debug!("Processed URL {}: status {}", result.url, result.status);
                if result.is_ok() {
                    summary.ok += 1;
                    ok.push(result);
                } else {
                    summary.failed += 1;
                    errors.push(result);
                }
            }
            self.counter.record(batch.len());

            if ok.len() + errors.len() >= self.config.write_batch_size {
                self.logs.append(&ok, &errors)?;
                ok.clear();
                errors.clear();
            }

            if self.counter.is_due() {
                let message = format!("Checked {} URLs", self.counter.pending());
                self.checkpoint(&message, &mut summary).await?;
            }
        }

        if !ok.is_empty() || !errors.is_empty() {
            self.logs.append(&ok, &errors)?;
        }

        if self.counter.has_pending() {
            let message = format!("Final check of {} URLs", self.counter.pending());
            self.checkpoint(&message, &mut summary).await?;
        }

        tracing::info!(
            "Check finished: {} URLs, ok: {}, failed: {}",
            summary.total,
            summary.ok,
            summary.failed
        );
        let (ok_stats, error_stats) = self.logs.stats()?;
        tracing::info!(
            "Reachable URLs written to {}, lines: {}",
            self.logs.ok_path().display(),
            ok_stats.line_count
        );
        tracing::info!(
            "Failed URLs written to {}, lines: {}",
            self.logs.error_path().display(),
            error_stats.line_count
        );
        tracing::info!("Elapsed: {:.2}s", started.elapsed().as_secs_f64());

        Ok(summary)
    }

    async fn check_batch(&self, batch: &[String]) -> Vec<CheckResult> {
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let probes = batch.iter().map(|url| async move {
            let status = self.fetcher.head_status(url, timeout).await;
            CheckResult {
                url: url.clone(),
                status,
            }
        });

        join_all(probes).await
    }

    async fn checkpoint(
        &mut self,
        message: &str,
        summary: &mut CheckSummary,
    ) -> Result<(), HarvestError> {
        checkpoint::checkpoint(self.checkpointer.as_ref(), &self.logs.paths(), message).await?;
        self.counter.reset();
        summary.checkpoints += 1;
        Ok(())
    }
}

/// Runs the reachability check with the checkpointer the configuration asks for
pub async fn run_check(config: Config) -> Result<CheckSummary, HarvestError> {
    let checkpointer = checkpoint::from_config(&config.checkpoint);
    let mut checker = ReachabilityChecker::new(&config, checkpointer)?;
    checker.run().await
}
