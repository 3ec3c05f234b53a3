//! Publishing the record file to a remote repository.
//!
//! [`Publisher`] stages, commits and pushes changed paths through a
//! [`VersionControl`] backend. [`GitCli`] shells out to `git`; [`MockVcs`]
//! records calls and simulates failures for tests.
//!
//! A failed push is retried exactly once, as a forced push, after a fixed
//! backoff. If that also fails the cycle gives up; nothing is queued for the
//! next cycle.

mod git;
mod mock;

pub use git::GitCli;
pub use mock::{MockVcs, VcsCall};

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::error::{PublishError, VcsError};

/// Default wait before the forced push retry.
pub const DEFAULT_PUSH_BACKOFF: Duration = Duration::from_secs(5);

/// Version-control capability used by the publisher.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Add `paths` to the index.
    async fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError>;

    /// Create a commit, even when the index has no changes.
    async fn commit(&self, message: &str) -> Result<(), VcsError>;

    /// Push the current branch to `remote`/`branch`.
    async fn push(&self, remote: &str, branch: &str, force: bool) -> Result<(), VcsError>;
}

/// Commit message recorded for a new value.
pub fn commit_message(value: Decimal) -> String {
    format!("Updated Fear & Greed Index: {}", value)
}

/// Stages, commits and pushes record changes.
#[derive(Debug)]
pub struct Publisher<V> {
    vcs: V,
    remote: String,
    branch: String,
    backoff: Duration,
}

impl<V: VersionControl> Publisher<V> {
    pub fn new(vcs: V, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            vcs,
            remote: remote.into(),
            branch: branch.into(),
            backoff: DEFAULT_PUSH_BACKOFF,
        }
    }

    /// Set the wait before the forced push retry.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the version-control backend.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Publish `changed` with a commit message referencing `value`.
    pub async fn publish(&self, changed: &[PathBuf], value: Decimal) -> Result<(), PublishError> {
        self.vcs
            .stage(changed)
            .await
            .map_err(|e| PublishError::StageFailed(e.to_string()))?;

        self.vcs
            .commit(&commit_message(value))
            .await
            .map_err(|e| PublishError::CommitFailed(e.to_string()))?;

        match self.vcs.push(&self.remote, &self.branch, false).await {
            Ok(()) => {
                info!(remote = %self.remote, branch = %self.branch, "Pushed record update");
                Ok(())
            }
            Err(first) => {
                warn!(
                    error = %first,
                    backoff_secs = self.backoff.as_secs_f64(),
                    "Push failed, retrying with force"
                );
                tokio::time::sleep(self.backoff).await;

                match self.vcs.push(&self.remote, &self.branch, true).await {
                    Ok(()) => {
                        info!(remote = %self.remote, branch = %self.branch, "Forced push succeeded");
                        Ok(())
                    }
                    Err(second) => {
                        error!(error = %second, "Forced push failed, abandoning this cycle");
                        Err(PublishError::PushFailed(second.to_string()))
                    }
                }
            }
        }
    }
}
