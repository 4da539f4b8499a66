//! # Libris
//!
//! A read-only virtual filesystem over ebook catalogs. Every library under a
//! source root is exposed as `/{library}/{series}/{series} - {index}.{ext}`,
//! backed by the book files the catalogs point at.
//!
//! [`Libris::start`] wires the pieces together in the order consumers rely
//! on: nothing is handed out until the first full index is loaded.
//!
//! ```no_run
//! use exn::ResultExt;
//! use libris::{Config, Libris, error::ErrorKind};
//!
//! # async fn run() -> libris::error::Result<()> {
//! let config = Config::load(None).or_raise(|| ErrorKind::Config)?;
//! let libris = Libris::start(config).await?;
//! let entries = libris.filesystem().list_directory("/");
//! # Ok(())
//! # }
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use libris_catalog::{CatalogIndex, SourceOptions};
use libris_watch::CatalogWatcher;
use std::path::Path;
use std::sync::Arc;

pub use libris_catalog as catalog;
pub use libris_config::{CatalogConfig, Config, WatchConfig};
pub use libris_vfs as vfs;
pub use libris_vfs::Filesystem;

/// A running instance: the loaded index, its filesystem adapter, and
/// (optionally) the watcher keeping the index up to date.
pub struct Libris {
    config: Config,
    filesystem: Filesystem,
    watcher: Option<CatalogWatcher>,
}
impl Libris {
    /// Validates the configuration, loads every library, then starts
    /// watching for catalog changes.
    ///
    /// Libraries that fail to load are logged and left out; only a source
    /// root that can't be read at all fails startup.
    pub async fn start(config: Config) -> Result<Self> {
        config.validate().or_raise(|| ErrorKind::Config)?;
        let options = SourceOptions {
            file_name: config.catalog.file_name.clone(),
            busy_timeout: config.catalog.busy_timeout(),
        };
        let index = Arc::new(CatalogIndex::new(&config.source, options));
        let reindex = index.reindex().await.or_raise(|| ErrorKind::Index)?;
        for (library, err) in &reindex.failed {
            tracing::warn!(library = library.as_str(), error = ?err, "Library unavailable at startup");
        }
        let watcher = if config.watch.enabled {
            Some(CatalogWatcher::start(Arc::clone(&index), config.watch.debounce()).or_raise(|| ErrorKind::Watch)?)
        } else {
            None
        };
        tracing::info!(
            source = %config.source.display(),
            mount = %config.mount.display(),
            libraries = reindex.loaded.len(),
            volume = reindex.volume,
            "Ready"
        );
        Ok(Self { filesystem: Filesystem::new(index), config, watcher })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the dispatcher should mount [`filesystem`](Self::filesystem).
    pub fn mount(&self) -> &Path {
        &self.config.mount
    }

    pub fn filesystem(&self) -> &Filesystem {
        &self.filesystem
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        self.filesystem.index()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}
