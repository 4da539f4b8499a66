//! Watcher Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A watcher error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source root could not be watched (missing, or the platform ran out
    /// of watch handles).
    #[display("unable to watch: {}", _0.display())]
    Watch(#[error(not(source))] PathBuf),
    /// Started outside of a Tokio runtime; nothing to schedule reindexing on.
    #[display("no async runtime available")]
    Runtime,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Watch(_))
    }
}
