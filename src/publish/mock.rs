//! Recording version-control double.

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::VersionControl;
use crate::error::VcsError;

/// A call made against [`MockVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Stage(Vec<PathBuf>),
    Commit(String),
    Push {
        remote: String,
        branch: String,
        force: bool,
    },
}

/// Test double that records calls and returns pre-configured results.
///
/// Every operation succeeds unless told otherwise. Push results are consumed
/// in order; once exhausted, pushes succeed.
#[derive(Debug, Default)]
pub struct MockVcs {
    calls: Mutex<Vec<VcsCall>>,
    push_results: Mutex<VecDeque<Result<(), VcsError>>>,
    stage_error: Option<String>,
    commit_error: Option<String>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_push_results(self, results: Vec<Result<(), VcsError>>) -> Self {
        *self.push_results.lock() = results.into();
        self
    }

    pub fn failing_stage(mut self, message: impl Into<String>) -> Self {
        self.stage_error = Some(message.into());
        self
    }

    pub fn failing_commit(mut self, message: impl Into<String>) -> Self {
        self.commit_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().clone()
    }

    /// The `force` flag of each push, in order.
    pub fn pushes(&self) -> Vec<bool> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                VcsCall::Push { force, .. } => Some(*force),
                _ => None,
            })
            .collect()
    }

    /// Messages of each commit, in order.
    pub fn commits(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                VcsCall::Commit(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        self.calls.lock().push(VcsCall::Stage(paths.to_vec()));
        match &self.stage_error {
            Some(message) => Err(VcsError::new("git add", message.clone())),
            None => Ok(()),
        }
    }

    async fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.calls.lock().push(VcsCall::Commit(message.to_string()));
        match &self.commit_error {
            Some(error) => Err(VcsError::new("git commit", error.clone())),
            None => Ok(()),
        }
    }

    async fn push(&self, remote: &str, branch: &str, force: bool) -> Result<(), VcsError> {
        self.calls.lock().push(VcsCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
            force,
        });
        let next = self.push_results.lock().pop_front();
        next.unwrap_or(Ok(()))
    }
}
