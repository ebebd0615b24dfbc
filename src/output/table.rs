//! CSV listing table
//!
//! The table is append-only during a run. It is only ever rewritten as a
//! whole, down to its header row, when a crawl starts from the discovered
//! last page.

use crate::crawler::ListingRecord;
use crate::output::traits::{OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Column names of the listing table
pub const TABLE_HEADER: [&str; 5] = ["Page", "Title", "URL", "Publisher", "Link"];

/// Size and line count of an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub size_bytes: u64,
    pub line_count: usize,
}

/// The CSV file listing records are appended to
#[derive(Debug, Clone)]
pub struct ListingTable {
    path: PathBuf,
}

impl ListingTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the table to just its header row
    pub fn reset(&self) -> OutputResult<()> {
        let file = File::create(&self.path).map_err(|source| self.write_error(source))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(TABLE_HEADER)
            .map_err(|source| self.csv_error(source))?;
        writer.flush().map_err(|source| self.write_error(source))?;

        tracing::info!("Reset CSV table: {}", self.path.display());
        Ok(())
    }

    /// Creates the table with a header row unless it already exists
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The table was created
    /// * `Ok(Some(stats))` - The table already existed and was left untouched
    pub fn ensure(&self) -> OutputResult<Option<TableStats>> {
        if !self.path.exists() {
            self.reset()?;
            tracing::info!("Created CSV table: {}", self.path.display());
            return Ok(None);
        }

        let stats = self.stats()?;
        tracing::info!(
            "CSV table exists: {}, size: {} bytes, lines: {}",
            self.path.display(),
            stats.size_bytes,
            stats.line_count
        );
        Ok(Some(stats))
    }

    /// Appends records to the table and returns how many were written
    pub fn append(&self, records: &[ListingRecord]) -> OutputResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        for record in records {
            let page = record.page.to_string();
            writer
                .write_record([
                    page.as_str(),
                    record.title.as_str(),
                    record.topic_url.as_str(),
                    record.publisher.as_str(),
                    record.link.as_str(),
                ])
                .map_err(|source| self.csv_error(source))?;
        }
        writer.flush().map_err(|source| self.write_error(source))?;

        Ok(records.len())
    }

    /// Current size and line count of the table
    pub fn stats(&self) -> OutputResult<TableStats> {
        file_stats(&self.path)
    }

    fn write_error(&self, source: std::io::Error) -> OutputError {
        OutputError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> OutputError {
        OutputError::Csv {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Size and newline count of a file
pub(crate) fn file_stats(path: &Path) -> OutputResult<TableStats> {
    let read_error = |source| OutputError::Read {
        path: path.display().to_string(),
        source,
    };

    let bytes = std::fs::read(path).map_err(read_error)?;
    let mut line_count = bytes.iter().filter(|&&b| b == b'\n').count();
    if bytes.last().is_some_and(|&b| b != b'\n') {
        line_count += 1;
    }

    Ok(TableStats {
        size_bytes: bytes.len() as u64,
        line_count,
    })
}
