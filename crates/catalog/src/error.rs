//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source root directory itself could not be enumerated.
    #[display("catalog root unavailable: {}", _0.display())]
    RootUnavailable(#[error(not(source))] PathBuf),
    /// A library's catalog file is locked or unreadable. The previously
    /// loaded snapshot of that library is still being served.
    #[display("catalog source unavailable: {}", _0.display())]
    SourceUnavailable(#[error(not(source))] PathBuf),
    /// A catalog row references a format code outside the supported set.
    /// This is a data-integrity problem with the catalog, not with us.
    #[display("unsupported book format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// A catalog row held a value that doesn't fit the model.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    #[display("database error")]
    Database,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RootUnavailable(_) | Self::SourceUnavailable(_))
    }
}
