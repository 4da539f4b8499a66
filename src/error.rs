//! Startup Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The error tree keeps the failing
//! component's own error as a child frame.

use derive_more::{Display, Error};

/// A startup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for startup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of startup failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("initial catalog index failed")]
    Index,
    #[display("unable to watch catalog source")]
    Watch,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index | Self::Watch)
    }
}
