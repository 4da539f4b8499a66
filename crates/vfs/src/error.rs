//! Filesystem Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every kind maps onto the errno a
//! filesystem dispatcher would hand back to the kernel.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A filesystem error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Virtual path does not resolve to anything (at the depth asked for).
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Write access was requested on a read-only file.
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// The filesystem can't be modified.
    #[display("read-only filesystem")]
    ReadOnly,
    /// The operation isn't implemented at all (extended attributes).
    #[display("operation not supported")]
    NotSupported,
    /// The physical file behind a book is missing or unreadable. Distinct
    /// from reading past the end of a book, which is not an error.
    #[display("backing file unreadable: {}", _0.display())]
    BackingFile(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The catalog may be mid-update, pointing at a file that's being moved.
        matches!(self, Self::BackingFile(_))
    }

    /// POSIX error number for this kind.
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound(_) => libc::ENOENT,
            Self::PermissionDenied(_) => libc::EACCES,
            Self::ReadOnly => libc::EROFS,
            Self::NotSupported => libc::ENOTSUP,
            Self::BackingFile(_) => libc::EIO,
        }
    }
}
