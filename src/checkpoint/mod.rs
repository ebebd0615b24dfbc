//! Checkpoint commits of output files
//!
//! A checkpoint stages the output files, commits them and pushes the commit.
//! A commit that finds nothing to record is tolerated; every other git
//! failure aborts the run.

mod git;
mod traits;

pub use git::{DisabledCheckpointer, GitCheckpointer};
pub use traits::{CheckpointError, CheckpointResult, Checkpointer, CommitOutcome};

use crate::config::CheckpointConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Stages `files`, commits them with `message` and pushes the commit
///
/// The push is skipped when git reports nothing to commit.
pub async fn checkpoint(
    checkpointer: &dyn Checkpointer,
    files: &[PathBuf],
    message: &str,
) -> CheckpointResult<CommitOutcome> {
    tracing::info!("Preparing checkpoint: {}", message);

    checkpointer.stage(files).await?;

    let outcome = checkpointer.commit(message).await?;
    match outcome {
        CommitOutcome::Committed => {
            checkpointer.push().await?;
            tracing::info!("Checkpoint committed and pushed: {}", message);
        }
        CommitOutcome::NothingToCommit => {
            tracing::warn!("No changes to commit for checkpoint: {}", message);
        }
    }

    Ok(outcome)
}

/// Builds the checkpointer described by the configuration
pub fn from_config(config: &CheckpointConfig) -> Arc<dyn Checkpointer> {
    if config.enabled {
        Arc::new(GitCheckpointer::from_config(config))
    } else {
        Arc::new(DisabledCheckpointer)
    }
}
