//! Reachability result logs
//!
//! Two line-oriented files: bare URLs that answered 200, and every other URL
//! annotated with the status it produced.

use crate::checker::CheckResult;
use crate::output::table::{file_stats, TableStats};
use crate::output::traits::{OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Line written to the error log for a failed check
pub fn format_error_line(result: &CheckResult) -> String {
    format!("{} (状态码: {})", result.url, result.status)
}

/// The OK and error logs of a reachability run
#[derive(Debug, Clone)]
pub struct ReachabilityLogs {
    ok_path: PathBuf,
    error_path: PathBuf,
}

impl ReachabilityLogs {
    pub fn new(ok_path: impl Into<PathBuf>, error_path: impl Into<PathBuf>) -> Self {
        Self {
            ok_path: ok_path.into(),
            error_path: error_path.into(),
        }
    }

    pub fn ok_path(&self) -> &Path {
        &self.ok_path
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    /// Both log paths, in the order they are staged
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.ok_path.clone(), self.error_path.clone()]
    }

    /// Truncates both logs to empty
    pub fn reset(&self) -> OutputResult<()> {
        for path in [&self.ok_path, &self.error_path] {
            File::create(path).map_err(|source| write_error(path, source))?;
            tracing::info!("Initialized output file: {}", path.display());
        }
        Ok(())
    }

    /// Appends buffered results to their logs
    pub fn append(&self, ok: &[CheckResult], errors: &[CheckResult]) -> OutputResult<()> {
        append_lines(&self.ok_path, ok.iter().map(|result| result.url.clone()))?;
        append_lines(&self.error_path, errors.iter().map(format_error_line))?;

        tracing::info!(
            "Wrote {} ({} entries), {} ({} entries)",
            self.ok_path.display(),
            ok.len(),
            self.error_path.display(),
            errors.len()
        );
        Ok(())
    }

    /// Size and line counts of the OK and error logs
    pub fn stats(&self) -> OutputResult<(TableStats, TableStats)> {
        Ok((file_stats(&self.ok_path)?, file_stats(&self.error_path)?))
    }
}

fn append_lines<I>(path: &Path, lines: I) -> OutputResult<()>
where
    I: IntoIterator<Item = String>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| write_error(path, source))?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line).map_err(|source| write_error(path, source))?;
    }
    writer.flush().map_err(|source| write_error(path, source))
}

fn write_error(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Write {
        path: path.display().to_string(),
        source,
    }
}
