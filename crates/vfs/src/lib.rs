//! # Libris VFS
//!
//! Exposes a [`CatalogIndex`](libris_catalog::CatalogIndex) as a read-only
//! filesystem, one call at a time.
//!
//! [`Filesystem`] is not tied to any particular user-space
//! filesystem dispatcher: every operation takes a virtual path and returns
//! plain data (or an error carrying an errno), so it can be driven by FUSE,
//! WinFsp, an NFS shim, or a test.

mod attr;
pub mod error;
mod fs;

pub use crate::attr::{Access, DIRECTORY_PERMISSIONS, DirEntry, FILE_PERMISSIONS, FileAttr, FileKind, NAME_MAX, VolumeStats};
pub use crate::fs::Filesystem;
