//! Download URL reachability checker
//!
//! Independent of the page crawl: it reads a list of download URLs, probes
//! each one with a HEAD request and sorts them into an OK log and an error
//! log, checkpointing the logs as it goes.

mod reachability;

pub use reachability::{read_url_list, run_check, ReachabilityChecker};

/// Outcome of probing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub url: String,

    /// Final HTTP status, or 0 when the request failed or timed out
    pub status: u16,
}

impl CheckResult {
    /// Only an exact 200 counts as reachable
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Totals of a finished reachability run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub checkpoints: usize,
}
