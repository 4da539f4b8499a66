//! # Libris Watch
//!
//! Keeps a [`CatalogIndex`](libris_catalog::CatalogIndex) in step with its
//! source. Catalog files are written in bursts (one transaction touches the
//! file several times), so reindexing waits until writes have been quiet for
//! a while.

mod debounce;
pub mod error;
mod watcher;

pub use crate::debounce::Debouncer;
pub use crate::watcher::{CatalogWatcher, DEFAULT_DEBOUNCE};
