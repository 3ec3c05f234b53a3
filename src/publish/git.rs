//! `git` command-line backend.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::VersionControl;
use crate::error::VcsError;

/// Runs `git` subcommands, optionally inside a given repository directory.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    repo_dir: Option<PathBuf>,
}

impl GitCli {
    /// Run git in the process's current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run git inside `repo_dir`.
    pub fn in_dir<P: AsRef<Path>>(repo_dir: P) -> Self {
        Self {
            repo_dir: Some(repo_dir.as_ref().to_path_buf()),
        }
    }

    pub fn repo_dir(&self) -> Option<&Path> {
        self.repo_dir.as_deref()
    }

    async fn git<I, S>(&self, args: I) -> Result<(), VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command = format!(
            "git {}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        debug!(%command, "Running version control command");

        let mut cmd = Command::new("git");
        cmd.args(&args);
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| VcsError::new(&command, format!("failed to execute: {}", e)))?;
        check(&command, output)
    }
}

fn check(command: &str, output: Output) -> Result<(), VcsError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    let message = if message.is_empty() {
        output.status.to_string()
    } else {
        message
    };
    Err(VcsError::new(command, message))
}

#[async_trait]
impl VersionControl for GitCli {
    /// Paths are relative to the process's working directory, not `repo_dir`.
    async fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        let mut args = vec![PathBuf::from("add"), PathBuf::from("--")];
        for path in paths {
            let path = std::path::absolute(path).map_err(|e| {
                VcsError::new("git add", format!("cannot resolve {}: {}", path.display(), e))
            })?;
            args.push(path);
        }
        self.git(args).await
    }

    async fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.git(["commit", "--allow-empty", "-m", message]).await
    }

    async fn push(&self, remote: &str, branch: &str, force: bool) -> Result<(), VcsError> {
        if force {
            self.git(["push", "--force", remote, branch]).await
        } else {
            self.git(["push", remote, branch]).await
        }
    }
}
