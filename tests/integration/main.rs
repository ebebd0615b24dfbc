//! Integration tests for Forum-Harvester
//!
//! These tests run the crawler and the reachability checker end-to-end
//! against wiremock servers, with a recording checkpointer in place of git.

mod checker_tests;
mod common;
mod crawl_tests;
