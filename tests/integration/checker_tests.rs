//! Integration tests for the reachability checker

use crate::common::{test_config, DelayedResponder, RecordingCheckpointer};
use forum_harvester::checkpoint::{CommitOutcome, DisabledCheckpointer};
use forum_harvester::config::Config;
use forum_harvester::{HarvestError, ReachabilityChecker};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `/ok` (200), `/missing` (404) and `/slow` (200 after a long delay)
async fn mount_downloads(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(server)
        .await;
}

fn checker_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = test_config(&server.uri(), dir.path());
    config.checker.batch_size = 2;
    config.checker.write_batch_size = 2;
    config.checker.commit_interval = 2;
    config.checker.timeout_ms = 200;

    let uri = server.uri();
    std::fs::write(
        &config.checker.input_file,
        format!("{uri}/ok\n\n  {uri}/missing  \n{uri}/slow\n"),
    )
    .unwrap();

    config
}

#[tokio::test]
async fn test_check_sorts_urls_by_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_downloads(&server).await;
    let config = checker_config(&server, &dir);

    let checkpointer = Arc::new(RecordingCheckpointer::default());
    let mut checker = ReachabilityChecker::new(&config, checkpointer.clone()).unwrap();
    let summary = checker.run().await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.ok, 1);
    assert_eq!(summary.failed, 2);

    let uri = server.uri();
    let ok = std::fs::read_to_string(&config.checker.ok_file).unwrap();
    assert_eq!(ok.lines().collect::<Vec<_>>(), vec![format!("{}/ok", uri)]);

    let errors = std::fs::read_to_string(&config.checker.error_file).unwrap();
    assert_eq!(
        errors.lines().collect::<Vec<_>>(),
        vec![
            format!("{}/missing (状态码: 404)", uri),
            format!("{}/slow (状态码: 0)", uri),
        ]
    );
}

#[tokio::test]
async fn test_check_checkpoints_logs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_downloads(&server).await;
    let config = checker_config(&server, &dir);

    let checkpointer = Arc::new(RecordingCheckpointer::default());
    let mut checker = ReachabilityChecker::new(&config, checkpointer.clone()).unwrap();
    let summary = checker.run().await.unwrap();

    assert_eq!(summary.checkpoints, 2);
    assert_eq!(
        checkpointer.commits(),
        vec!["Checked 2 URLs".to_string(), "Final check of 1 URLs".to_string()]
    );

    let logs = checker.logs().paths();
    assert_eq!(checkpointer.prepared(), logs);
    assert_eq!(checkpointer.staged(), vec![logs.clone(), logs]);
}

#[tokio::test]
async fn test_check_is_repeatable() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_downloads(&server).await;
    let config = checker_config(&server, &dir);

    let read_logs = || {
        (
            std::fs::read_to_string(&config.checker.ok_file).unwrap(),
            std::fs::read_to_string(&config.checker.error_file).unwrap(),
        )
    };

    let mut checker = ReachabilityChecker::new(&config, Arc::new(DisabledCheckpointer)).unwrap();
    checker.run().await.unwrap();
    let first = read_logs();

    let mut checker = ReachabilityChecker::new(&config, Arc::new(DisabledCheckpointer)).unwrap();
    checker.run().await.unwrap();
    let second = read_logs();

    assert_eq!(first, second);
    assert_eq!(second.1.lines().count(), 2);
}

#[tokio::test]
async fn test_missing_input_list_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let mut checker = ReachabilityChecker::new(&config, Arc::new(DisabledCheckpointer)).unwrap();
    let result = checker.run().await;

    assert!(matches!(result, Err(HarvestError::InputList { .. })));
    assert!(!dir.path().join("ok.txt").exists());
}

#[tokio::test]
async fn test_empty_input_list_truncates_logs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    std::fs::write(&config.checker.input_file, "\n  \n").unwrap();
    std::fs::write(&config.checker.ok_file, "stale\n").unwrap();

    let checkpointer = Arc::new(RecordingCheckpointer::default());
    let mut checker = ReachabilityChecker::new(&config, checkpointer.clone()).unwrap();
    let summary = checker.run().await.unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.checkpoints, 0);
    assert!(checkpointer.commits().is_empty());
    assert_eq!(std::fs::read_to_string(&config.checker.ok_file).unwrap(), "");
}

#[tokio::test]
async fn test_check_counter_resets_when_nothing_was_committed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_downloads(&server).await;
    let config = checker_config(&server, &dir);

    let checkpointer = Arc::new(RecordingCheckpointer::with_outcome(
        CommitOutcome::NothingToCommit,
    ));
    let mut checker = ReachabilityChecker::new(&config, checkpointer.clone()).unwrap();
    let summary = checker.run().await.unwrap();

    assert_eq!(summary.checkpoints, 2);
    assert_eq!(
        checkpointer.commits(),
        vec!["Checked 2 URLs".to_string(), "Final check of 1 URLs".to_string()]
    );
    assert_eq!(checkpointer.pushes(), 0);
}

#[tokio::test]
async fn test_batches_run_one_after_another() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let responder = DelayedResponder::new(Duration::from_millis(200), "");
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/download/"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), dir.path());
    config.checker.batch_size = 3;
    config.checker.timeout_ms = 5000;

    let urls: Vec<String> = (1..=8)
        .map(|n| format!("{}/download/{}.torrent", server.uri(), n))
        .collect();
    std::fs::write(&config.checker.input_file, urls.join("\n")).unwrap();

    let mut checker = ReachabilityChecker::new(&config, Arc::new(DisabledCheckpointer)).unwrap();
    let summary = checker.run().await.unwrap();

    assert_eq!(summary.total, 8);
    assert_eq!(summary.ok, 8);
    assert_eq!(responder.requests(), 8);
    assert!(
        responder.peak_in_flight() <= 3,
        "peak in flight was {}",
        responder.peak_in_flight()
    );
}
