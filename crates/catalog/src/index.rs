//! The in-memory library → series → book index.

use crate::error::{Error, ErrorKind, Result};
use crate::models::{Book, Library, Series};
use crate::path::VirtualPath;
use crate::source::{CatalogSource, SourceOptions};
use exn::ResultExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::instrument;

/// A resolved entry of the virtual tree.
///
/// Holds shared references into the snapshot that was current at resolution
/// time, so it stays consistent even if a reindex swaps the library out
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root,
    Library(Arc<Library>),
    Series(Arc<Library>, Arc<Series>),
    Book(Arc<Library>, Arc<Series>, Arc<Book>),
}

/// Summary of a completed [`CatalogIndex::reindex`] run.
#[derive(Debug)]
pub struct Reindex {
    /// Libraries that were (re)loaded successfully.
    pub loaded: Vec<String>,
    /// Libraries that failed to load, and why. Their previous snapshot (if
    /// any) is still being served.
    pub failed: Vec<(String, Error)>,
    /// Cumulative size of every book in the index after the run.
    pub volume: u64,
}

/// The catalog index.
///
/// Owns every loaded [`Library`]. Readers get cheap [`Arc`] snapshots; the
/// only mutation is a library being swapped out wholesale during
/// [`reindex`](Self::reindex) or [`load_library`](Self::load_library).
#[derive(Debug)]
pub struct CatalogIndex {
    root: PathBuf,
    options: SourceOptions,
    libraries: RwLock<BTreeMap<String, Arc<Library>>>,
    volume: AtomicU64,
    // Serializes reindex runs; lookups never touch it.
    reindexing: Mutex<()>,
}
impl CatalogIndex {
    /// Create an empty index over the given source root. Nothing is loaded
    /// until [`reindex`](Self::reindex) runs.
    pub fn new(root: impl Into<PathBuf>, options: SourceOptions) -> Self {
        Self {
            root: root.into(),
            options,
            libraries: RwLock::new(BTreeMap::new()),
            volume: AtomicU64::new(0),
            reindexing: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    /// Cumulative size, in bytes, of every book as of the last reindex.
    pub fn volume(&self) -> u64 {
        self.volume.load(Ordering::Acquire)
    }

    /// Snapshot of every library, in name order.
    pub fn libraries(&self) -> Vec<Arc<Library>> {
        self.libraries.read().values().cloned().collect()
    }

    /// Finds a library by name.
    pub fn library(&self, name: &str) -> Option<Arc<Library>> {
        self.libraries.read().get(name).cloned()
    }

    /// Finds the library a virtual path points at (or into). The root path
    /// never resolves to a library.
    pub fn get_library(&self, path: &str) -> Option<Arc<Library>> {
        self.library(VirtualPath::parse(path)?.library()?)
    }

    /// Classifies a virtual path, deepest match first.
    ///
    /// Each classification only matches paths with exactly its own depth: a
    /// library-deep path is never a series even if a series of that name
    /// exists somewhere.
    pub fn resolve(&self, path: &str) -> Option<Node> {
        let parsed = VirtualPath::parse(path)?;
        if parsed == VirtualPath::Root {
            return Some(Node::Root);
        }
        let library = self.get_library(path)?;
        if parsed.depth() == 1 {
            return Some(Node::Library(library));
        }
        let series = library.get_series(path)?.clone();
        if parsed.depth() == 2 {
            return Some(Node::Series(library, series));
        }
        let book = series.get_book(path)?.clone();
        Some(Node::Book(library, series, book))
    }

    /// Rescans the source root and reloads every library found in it.
    ///
    /// An immediate subdirectory of the root is a library if it contains a
    /// catalog file. A library that fails to load keeps whatever snapshot it
    /// had before (none, the first time); failures never stop the remaining
    /// libraries from loading. Libraries are never removed.
    ///
    /// Only fails if the root itself can't be enumerated.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn reindex(&self) -> Result<Reindex> {
        let _guard = self.reindexing.lock().await;
        let candidates = self.discover().await?;
        let mut loaded = Vec::new();
        let mut failed = Vec::new();
        for name in candidates {
            match self.load_library_inner(&name).await {
                Ok(()) => loaded.push(name),
                Err(err) => failed.push((name, err)),
            }
        }
        let volume = self.recompute_volume();
        tracing::info!(loaded = loaded.len(), failed = failed.len(), volume, "Reindex complete");
        Ok(Reindex { loaded, failed, volume })
    }

    /// Loads (or reloads) a single library by name and swaps it into the
    /// index. On failure the library's previous snapshot is left untouched.
    pub async fn load_library(&self, name: &str) -> Result<()> {
        let _guard = self.reindexing.lock().await;
        let result = self.load_library_inner(name).await;
        self.recompute_volume();
        result
    }

    /// Names of the root's immediate subdirectories holding a catalog file,
    /// in name order. Symlinked directories count.
    async fn discover(&self) -> Result<Vec<String>> {
        let unavailable = || ErrorKind::RootUnavailable(self.root.clone());
        let mut entries = fs::read_dir(&self.root).await.or_raise(unavailable)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.or_raise(unavailable)? {
            let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
            if !is_dir {
                continue;
            }
            // Library names become path segments; a directory name that
            // isn't valid UTF-8 can't be addressed, so it can't be a library.
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "Skipping library with non UTF-8 name");
                continue;
            };
            let catalog = CatalogSource::new(entry.path(), &self.options);
            if fs::try_exists(catalog.path()).await.unwrap_or(false) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn load_library_inner(&self, name: &str) -> Result<()> {
        let directory = self.root.join(name);
        let source = CatalogSource::new(&directory, &self.options);
        let series = match source.load().await {
            Ok(series) => series,
            Err(err) => {
                match &*err {
                    ErrorKind::UnsupportedFormat(code) => tracing::error!(
                        library = name,
                        format = code.as_str(),
                        "Catalog contains an unsupported format; library not reloaded"
                    ),
                    _ => tracing::warn!(
                        library = name,
                        error = ?err,
                        "Catalog unavailable; keeping previous snapshot"
                    ),
                }
                return Err(err);
            },
        };
        let library = Arc::new(Library::new(name, directory, series));
        tracing::info!(
            library = name,
            series = library.series().len(),
            books = library.book_count(),
            "Loaded library"
        );
        // Replace under a single write lock so readers see either the old
        // library or the new one, never neither.
        let mut libraries = self.libraries.write();
        libraries.remove(name);
        libraries.insert(name.to_string(), library);
        Ok(())
    }

    fn recompute_volume(&self) -> u64 {
        let volume = self.libraries.read().values().map(|l| l.volume()).sum();
        self.volume.store(volume, Ordering::Release);
        volume
    }
}
