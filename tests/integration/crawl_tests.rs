//! Integration tests for the page crawl
//!
//! These tests serve a small forum from wiremock and check the CSV table and
//! the checkpoint calls a crawl produces.

use crate::common::{
    listing_page, listing_path, read_table, test_config, topic_ids, DelayedResponder,
    RecordingCheckpointer,
};
use forum_harvester::checkpoint::{CommitOutcome, DisabledCheckpointer};
use forum_harvester::crawler::{ContentLink, Coordinator};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn torrent_body(topic_id: u32) -> Vec<u8> {
    format!("d8:announce9:tracker:{}4:infod4:name4:teste", topic_id).into_bytes()
}

/// Mounts the warm-up page and `pages` listing pages with the given last page
async fn mount_forum(server: &MockServer, pages: &[u32], last_page: u32) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(server)
        .await;

    for &page in pages {
        Mock::given(method("GET"))
            .and(path(listing_path(page)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_page(page, last_page))
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(server)
            .await;
    }
}

/// Serves torrent files for `topic_ids`; every other torrent answers 404
async fn mount_torrents(server: &MockServer, topic_ids: &[u32]) {
    for &id in topic_ids {
        Mock::given(method("GET"))
            .and(path(format!("/files/{}.torrent", id)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(torrent_body(id)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_crawl_writes_every_listing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());
    let csv_path = dir.path().join("1670.csv");

    mount_forum(&server, &[1, 2, 3], 3).await;
    // Page 3's first topic has a torrent; everything else falls back
    mount_torrents(&server, &[31]).await;

    let checkpointer = Arc::new(RecordingCheckpointer::default());
    let mut coordinator = Coordinator::new(config, checkpointer.clone()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.start_page, 3);
    assert_eq!(report.end_page, 1);
    assert_eq!(report.pages_dispatched, 3);
    assert_eq!(report.pages_with_records, 3);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.records_written, 6);

    let (header, rows) = read_table(&csv_path);
    assert_eq!(header, vec!["Page", "Title", "URL", "Publisher", "Link"]);
    assert_eq!(rows.len(), 6);

    let titles: HashSet<String> = rows.iter().map(|row| row[1].clone()).collect();
    let expected: HashSet<String> = [1, 2, 3]
        .into_iter()
        .flat_map(topic_ids)
        .map(|id| format!("Nice Title {}", id))
        .collect();
    assert_eq!(titles, expected);

    for row in &rows {
        assert_eq!(row[3], "uploader");

        let page: u32 = row[0].parse().unwrap();
        let id: u32 = row[2]
            .trim_end_matches("-t.html")
            .rsplit('/')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(topic_ids(page).contains(&id));
        assert_eq!(row[2], format!("{}/forum-1670/{}-t.html", server.uri(), id));

        if id == 31 {
            let magnet = ContentLink::from_torrent_bytes(&torrent_body(31));
            assert_eq!(row[4], magnet.as_str());
            assert!(row[4].starts_with("magnet:?xt=urn:btih:"));
        } else {
            assert_eq!(row[4], format!("{}/files/{}.torrent", server.uri(), id));
        }
    }

    // Pages arrive with two records each: one checkpoint at four, one final
    let commits = checkpointer.commits();
    assert_eq!(report.checkpoints, 2);
    assert_eq!(commits.len(), 2);
    assert!(commits[0].starts_with("Update 4 records through page "));
    assert_eq!(commits[1], "Final update of remaining 2 records");
    assert_eq!(checkpointer.pushes(), 2);
    assert_eq!(checkpointer.prepared(), vec![csv_path.clone()]);
    assert!(checkpointer.staged().iter().all(|files| files == &vec![csv_path.clone()]));
}

#[tokio::test]
async fn test_failing_page_does_not_stop_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());
    let csv_path = dir.path().join("1670.csv");

    mount_forum(&server, &[1, 3], 3).await;

    // Two page attempts, each retried once by the fetcher
    Mock::given(method("GET"))
        .and(path(listing_path(2)))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(config, Arc::new(DisabledCheckpointer)).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_dispatched, 3);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_with_records, 2);
    assert_eq!(report.records_written, 4);

    let (_, rows) = read_table(&csv_path);
    let pages: HashSet<String> = rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(pages, HashSet::from(["1".to_string(), "3".to_string()]));
}

#[tokio::test]
async fn test_discovery_rewrites_table() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("1670.csv");

    std::fs::write(
        &csv_path,
        "Page,Title,URL,Publisher,Link\n9,Stale,https://old/9-t.html,someone,\n",
    )
    .unwrap();

    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.start_page = 0;
    config.crawler.end_page = 1;

    mount_forum(&server, &[1, 2], 2).await;

    let mut coordinator = Coordinator::new(config, Arc::new(DisabledCheckpointer)).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.start_page, 2);
    assert_eq!(report.pages_dispatched, 2);
    assert_eq!(report.records_written, 4);

    let (_, rows) = read_table(&csv_path);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row[1] != "Stale"));
}

#[tokio::test]
async fn test_existing_table_is_appended() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("1670.csv");

    std::fs::write(
        &csv_path,
        "Page,Title,URL,Publisher,Link\n9,Earlier,https://old/9-t.html,someone,\n",
    )
    .unwrap();

    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.start_page = 1;
    config.crawler.end_page = 1;

    mount_forum(&server, &[1], 1).await;

    let checkpointer = Arc::new(RecordingCheckpointer::default());
    let mut coordinator = Coordinator::new(config, checkpointer.clone()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records_written, 2);

    let (_, rows) = read_table(&csv_path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][1], "Earlier");

    // Below the interval, so only the final checkpoint runs
    assert_eq!(
        checkpointer.commits(),
        vec!["Final update of remaining 2 records".to_string()]
    );
}

#[tokio::test]
async fn test_discovery_without_forum_defaults_to_first_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.start_page = 0;

    let coordinator = Coordinator::new(config, Arc::new(DisabledCheckpointer)).unwrap();
    assert_eq!(coordinator.discover_max_page().await, 1);
}

#[tokio::test]
async fn test_counter_resets_when_nothing_was_committed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    mount_forum(&server, &[1, 2, 3], 3).await;

    let checkpointer = Arc::new(RecordingCheckpointer::with_outcome(
        CommitOutcome::NothingToCommit,
    ));
    let mut coordinator = Coordinator::new(config, checkpointer.clone()).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records_written, 6);
    assert_eq!(report.checkpoints, 2);

    // Without a reset the third page would trigger "Update 6 records ..."
    let commits = checkpointer.commits();
    assert_eq!(commits.len(), 2);
    assert!(commits[0].starts_with("Update 4 records through page "));
    assert_eq!(commits[1], "Final update of remaining 2 records");
    assert_eq!(checkpointer.pushes(), 0);
}

#[tokio::test]
async fn test_pages_in_flight_never_exceed_workers() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = test_config(&server.uri(), dir.path());
    config.crawler.start_page = 8;
    config.crawler.end_page = 1;
    config.crawler.max_workers = 2;

    let responder = DelayedResponder::new(
        Duration::from_millis(200),
        "<html><body><table></table></body></html>",
    );
    Mock::given(method("GET"))
        .and(path_regex(r"^/forum-1670/"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(config, Arc::new(DisabledCheckpointer)).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_dispatched, 8);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(responder.requests(), 8);
    assert!(
        responder.peak_in_flight() <= 2,
        "peak in flight was {}",
        responder.peak_in_flight()
    );
}
