//! Error types for each stage of a recording cycle.

use std::io;

use thiserror::Error;

/// Errors that can occur when fetching the indicator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The source answered with a non-success status code.
    #[error("Source returned status {0}")]
    BadStatus(u16),

    /// The body was blank, not JSON, or lacked a numeric score.
    #[error("Empty or invalid response body: {0}")]
    EmptyOrInvalidBody(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // A body cut off mid-read is a transport failure, not a bad payload
        if err.is_decode() && !err.is_timeout() {
            FetchError::EmptyOrInvalidBody(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record file or its directory is not writable.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The filesystem is out of space.
    #[error("No space left on device: {0}")]
    Space(String),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Other(String),

    /// The last stored row could not be parsed back into an observation.
    #[error("Malformed record row: {0}")]
    Malformed(String),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                StoreError::Permission(err.to_string())
            }
            io::ErrorKind::StorageFull => StoreError::Space(err.to_string()),
            _ => StoreError::Other(err.to_string()),
        }
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => StoreError::from(io_err),
            other => StoreError::Malformed(format!("{:?}", other)),
        }
    }
}

/// Errors raised while publishing the record file.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Staging the changed paths failed.
    #[error("Failed to stage changes: {0}")]
    StageFailed(String),

    /// Creating the commit failed.
    #[error("Failed to commit: {0}")]
    CommitFailed(String),

    /// Both the push and the forced retry failed.
    #[error("Push failed after forced retry: {0}")]
    PushFailed(String),
}

/// A failed version-control command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} failed: {message}")]
pub struct VcsError {
    /// The command that was run, e.g. `git push origin main`.
    pub command: String,
    /// Captured stderr, or the exit status when stderr was empty.
    pub message: String,
}

impl VcsError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(StoreError::from(denied), StoreError::Permission(_)));

        let full = io::Error::new(io::ErrorKind::StorageFull, "disk full");
        assert!(matches!(StoreError::from(full), StoreError::Space(_)));

        let other = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(StoreError::from(other), StoreError::Other(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::BadStatus(503).to_string(),
            "Source returned status 503"
        );
        assert_eq!(
            PublishError::PushFailed("rejected".into()).to_string(),
            "Push failed after forced retry: rejected"
        );
    }
}
