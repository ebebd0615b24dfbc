//! Checkpointer trait and error types

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// What a commit attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was recorded
    Committed,

    /// The working tree had no staged changes
    NothingToCommit,
}

/// Version-control operations behind a checkpoint
///
/// The crawl and the reachability checker only talk to this trait, so tests
/// can substitute a recorder for the git implementation.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// One-time repository setup for the output files, run before any output
    /// is written
    async fn prepare(&self, _files: &[PathBuf]) -> CheckpointResult<()> {
        Ok(())
    }

    /// Stages the given files
    async fn stage(&self, files: &[PathBuf]) -> CheckpointResult<()>;

    /// Commits staged changes
    async fn commit(&self, message: &str) -> CheckpointResult<CommitOutcome>;

    /// Pushes to the configured remote
    async fn push(&self) -> CheckpointResult<()>;
}
