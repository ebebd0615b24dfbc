//! Git-backed checkpoints
//!
//! Every operation shells out to the `git` binary in the configured working
//! tree, so credentials and remotes come from the surrounding repository.

use crate::checkpoint::traits::{CheckpointError, CheckpointResult, Checkpointer, CommitOutcome};
use crate::config::CheckpointConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Checkpoints output files into a git repository
#[derive(Debug, Clone)]
pub struct GitCheckpointer {
    repo_dir: PathBuf,
    lfs_track: bool,
    remote: Option<String>,
    branch: Option<String>,
}

impl GitCheckpointer {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            lfs_track: false,
            remote: None,
            branch: None,
        }
    }

    pub fn from_config(config: &CheckpointConfig) -> Self {
        Self {
            repo_dir: PathBuf::from(&config.repo_dir),
            lfs_track: config.lfs_track,
            remote: config.remote.clone(),
            branch: config.branch.clone(),
        }
    }

    pub fn with_lfs_track(mut self, lfs_track: bool) -> Self {
        self.lfs_track = lfs_track;
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>, branch: Option<String>) -> Self {
        self.remote = Some(remote.into());
        self.branch = branch;
        self
    }

    /// Arguments of the push command
    pub fn push_args(&self) -> Vec<String> {
        let mut args = vec!["push".to_string()];
        if let Some(remote) = &self.remote {
            args.push(remote.clone());
            if let Some(branch) = &self.branch {
                args.push(branch.clone());
            }
        }
        args
    }

    async fn git<I, S>(&self, args: I) -> CheckpointResult<(String, Output)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let command = format!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|source| CheckpointError::Spawn {
                command: command.clone(),
                source,
            })?;

        tracing::debug!(
            "{} stdout: {}, stderr: {}",
            command,
            String::from_utf8_lossy(&output.stdout).trim(),
            String::from_utf8_lossy(&output.stderr).trim()
        );

        Ok((command, output))
    }

    /// Runs a git command that must succeed
    async fn git_checked<I, S>(&self, args: I) -> CheckpointResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (command, output) = self.git(args).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("Git operation failed: {}: {}", command, stderr);
            Err(CheckpointError::Failed { command, stderr })
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl Checkpointer for GitCheckpointer {
    async fn prepare(&self, files: &[PathBuf]) -> CheckpointResult<()> {
        if !self.lfs_track {
            return Ok(());
        }

        for file in files {
            self.git_checked(["lfs".to_string(), "track".to_string(), path_arg(file)])
                .await?;
            tracing::debug!("Git LFS tracking {}", file.display());
        }
        Ok(())
    }

    async fn stage(&self, files: &[PathBuf]) -> CheckpointResult<()> {
        for file in files {
            self.git_checked(["add".to_string(), path_arg(file)]).await?;
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> CheckpointResult<CommitOutcome> {
        let (_, output) = self.git(["commit", "-m", message]).await?;

        // git exits nonzero when the index has nothing new
        if output.status.success() {
            Ok(CommitOutcome::Committed)
        } else {
            tracing::debug!(
                "git commit exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stdout).trim()
            );
            Ok(CommitOutcome::NothingToCommit)
        }
    }

    async fn push(&self) -> CheckpointResult<()> {
        self.git_checked(self.push_args()).await
    }
}

/// Checkpointer for runs that must not touch git
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCheckpointer;

#[async_trait]
impl Checkpointer for DisabledCheckpointer {
    async fn stage(&self, files: &[PathBuf]) -> CheckpointResult<()> {
        tracing::debug!("Checkpoints disabled, not staging {} files", files.len());
        Ok(())
    }

    async fn commit(&self, message: &str) -> CheckpointResult<CommitOutcome> {
        tracing::debug!("Checkpoints disabled, skipping commit: {}", message);
        Ok(CommitOutcome::NothingToCommit)
    }

    async fn push(&self) -> CheckpointResult<()> {
        Ok(())
    }
}
