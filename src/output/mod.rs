//! Output module for the flat files a run produces
//!
//! This module handles:
//! - The CSV listing table written by the page crawl
//! - The OK/error logs written by the reachability checker
//! - Size and line statistics for written files

mod logs;
mod table;
mod traits;

pub use logs::{format_error_line, ReachabilityLogs};
pub use table::{ListingTable, TableStats, TABLE_HEADER};
pub use traits::{OutputError, OutputResult};
