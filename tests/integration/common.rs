//! Shared fixtures for the integration tests

use async_trait::async_trait;
use forum_harvester::checkpoint::{CheckpointResult, Checkpointer, CommitOutcome};
use forum_harvester::config::Config;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::{Request, Respond, ResponseTemplate};

/// Checkpointer that records every call instead of running git
pub struct RecordingCheckpointer {
    outcome: CommitOutcome,
    prepared: Mutex<Vec<PathBuf>>,
    staged: Mutex<Vec<Vec<PathBuf>>>,
    commits: Mutex<Vec<String>>,
    pushes: Mutex<usize>,
}

impl Default for RecordingCheckpointer {
    fn default() -> Self {
        Self::with_outcome(CommitOutcome::Committed)
    }
}

impl RecordingCheckpointer {
    /// Every commit reports `outcome`
    pub fn with_outcome(outcome: CommitOutcome) -> Self {
        Self {
            outcome,
            prepared: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            pushes: Mutex::new(0),
        }
    }

    pub fn prepared(&self) -> Vec<PathBuf> {
        self.prepared.lock().unwrap().clone()
    }

    pub fn staged(&self) -> Vec<Vec<PathBuf>> {
        self.staged.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> usize {
        *self.pushes.lock().unwrap()
    }
}

#[async_trait]
impl Checkpointer for RecordingCheckpointer {
    async fn prepare(&self, files: &[PathBuf]) -> CheckpointResult<()> {
        self.prepared.lock().unwrap().extend_from_slice(files);
        Ok(())
    }

    async fn stage(&self, files: &[PathBuf]) -> CheckpointResult<()> {
        self.staged.lock().unwrap().push(files.to_vec());
        Ok(())
    }

    async fn commit(&self, message: &str) -> CheckpointResult<CommitOutcome> {
        self.commits.lock().unwrap().push(message.to_string());
        Ok(self.outcome)
    }

    async fn push(&self) -> CheckpointResult<()> {
        *self.pushes.lock().unwrap() += 1;
        Ok(())
    }
}

/// Answers every request after a fixed delay and records when each arrived
#[derive(Clone)]
pub struct DelayedResponder {
    delay: Duration,
    body: String,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl DelayedResponder {
    pub fn new(delay: Duration, body: impl Into<String>) -> Self {
        Self {
            delay,
            body: body.into(),
            arrivals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }

    /// Most requests that arrived within three quarters of one response delay
    /// of each other, i.e. the peak number in flight at once
    pub fn peak_in_flight(&self) -> usize {
        let arrivals = self.arrivals.lock().unwrap().clone();
        let window = self.delay * 3 / 4;

        arrivals
            .iter()
            .map(|&start| {
                arrivals
                    .iter()
                    .filter(|&&other| other >= start && other < start + window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

impl Respond for DelayedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200)
            .set_body_string(self.body.clone())
            .set_delay(self.delay)
    }
}

/// Configuration pointed at a mock forum, with every delay cut down
pub fn test_config(server_uri: &str, dir: &Path) -> Config {
    let mut config = Config::default();

    config.forum.forum_url = format!("{}/forum-1670/", server_uri);
    config.forum.download_base_url = format!("{}/files/", server_uri);
    config.forum.warm_up_url = Some(format!("{}/", server_uri));

    config.http.max_attempts = 2;
    config.http.base_delay_ms = 1;

    config.crawler.start_page = 3;
    config.crawler.end_page = 1;
    config.crawler.max_workers = 2;
    config.crawler.page_retries = 1;
    config.crawler.page_retry_delay_ms = 1;
    config.crawler.min_pace_ms = 0;
    config.crawler.max_pace_ms = 0;
    config.crawler.show_progress = false;

    config.checkpoint.commit_interval = 4;

    config.checker.input_file = dir.join("urls.txt").display().to_string();
    config.checker.ok_file = dir.join("ok.txt").display().to_string();
    config.checker.error_file = dir.join("error.txt").display().to_string();

    config.output.csv_file = Some(dir.join("1670.csv").display().to_string());

    config
}

/// One listing row in the forum's markup
pub fn listing_row(topic_id: u32, title: &str, author: &str) -> String {
    format!(
        r#"<tr id="tr-{id}">
            <td><a class="torTopic bold tt-text" href="/forum-1670/{id}-t.html">{title}</a>
            <div class="topicAuthor"><a class="topicAuthor" href="/user/{author}">{author}</a></div></td>
        </tr>"#,
        id = topic_id,
        title = title,
        author = author
    )
}

/// A listing page with two topics and a pagination bar up to `last_page`
pub fn listing_page(page: u32, last_page: u32) -> String {
    let rows: Vec<String> = topic_ids(page)
        .into_iter()
        .map(|id| listing_row(id, &format!("Nice Title {} / ART", id), "uploader"))
        .collect();

    let pagination: String = (2..=last_page)
        .map(|n| format!(r#"<a href="/forum-1670/page/{n}/">{n}</a>"#))
        .collect();

    format!(
        r#"<html><body>
            <div id="pagination">{}</div>
            <table>{}</table>
        </body></html>"#,
        pagination,
        rows.join("\n")
    )
}

/// Topic ids listed on a page
pub fn topic_ids(page: u32) -> Vec<u32> {
    vec![page * 10 + 1, page * 10 + 2]
}

/// Path of a listing page on the mock server
pub fn listing_path(page: u32) -> String {
    if page <= 1 {
        "/forum-1670/".to_string()
    } else {
        format!("/forum-1670/page/{}/", page)
    }
}

/// Reads the CSV table into its header and data rows
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}
