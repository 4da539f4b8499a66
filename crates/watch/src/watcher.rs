use crate::debounce::Debouncer;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use libris_catalog::CatalogIndex;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Default time to wait for catalog writes to settle before reindexing.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a source root and reindexes once catalog writes settle.
///
/// Dropping the watcher stops observing the source root and cancels any
/// reindex that hasn't started yet.
pub struct CatalogWatcher {
    // Only `None` while dropping.
    watcher: Option<RecommendedWatcher>,
    debouncer: Arc<Debouncer>,
}
impl CatalogWatcher {
    /// Starts watching the index's source root recursively. Must be called
    /// from within a Tokio runtime.
    pub fn start(index: Arc<CatalogIndex>, delay: Duration) -> Result<Self> {
        let root = index.root().to_path_buf();
        let file_name = index.options().file_name.clone();
        let runtime = Handle::try_current().or_raise(|| ErrorKind::Runtime)?;
        let debouncer = Arc::new(Debouncer::new(runtime, delay, move || {
            let index = Arc::clone(&index);
            async move {
                // Per-library failures are logged (and isolated) by the index.
                if let Err(err) = index.reindex().await {
                    tracing::warn!(error = ?err, "Reindex after catalog change failed");
                }
            }
        }));
        let trigger = Arc::clone(&debouncer);
        let mut watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) if is_catalog_event(&event, &file_name) => {
                tracing::debug!(kind = ?event.kind, paths = ?event.paths, "Catalog changed");
                trigger.trigger();
            },
            Ok(_) => {},
            Err(err) => tracing::warn!(error = %err, "File watcher error"),
        })
        .or_raise(|| ErrorKind::Watch(root.clone()))?;
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .or_raise(|| ErrorKind::Watch(root.clone()))?;
        tracing::info!(root = %root.display(), delay_ms = delay.as_millis() as u64, "Watching for catalog changes");
        Ok(Self { watcher: Some(watcher), debouncer })
    }

    /// Whether a reindex is scheduled but hasn't started yet.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        // Stop observing first, so new events can't re-arm the timer after
        // it's cancelled. A trigger already being delivered on the watcher's
        // thread is cancelled when that thread lets go of the debouncer.
        drop(self.watcher.take());
        self.debouncer.cancel();
    }
}

/// Whether an event means a catalog file was created or written to.
pub(crate) fn is_catalog_event(event: &Event, file_name: &str) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
    );
    relevant && event.paths.iter().any(|path| path.file_name().is_some_and(|name| name == file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_catalog::SourceOptions;
    use libris_catalog::fixture::{CatalogFixture, FixtureBook};
    use notify::event::{AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::path::PathBuf;

    fn make_test_event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_catalog_events() {
        let catalog = "/books/Fiction/metadata.db";
        let qualifying = [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Modify(ModifyKind::Data(DataChange::Size)),
            EventKind::Modify(ModifyKind::Any),
        ];
        for kind in qualifying {
            assert!(is_catalog_event(&make_test_event(kind, catalog), "metadata.db"), "{kind:?}");
        }
        let ignored = [
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            EventKind::Remove(RemoveKind::File),
        ];
        for kind in ignored {
            assert!(!is_catalog_event(&make_test_event(kind, catalog), "metadata.db"), "{kind:?}");
        }
        let kind = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        assert!(!is_catalog_event(&make_test_event(kind, "/books/Fiction/metadata.db-journal"), "metadata.db"));
        assert!(!is_catalog_event(&make_test_event(kind, "/books/Fiction/Mort.epub"), "metadata.db"));
        assert!(is_catalog_event(&make_test_event(kind, "/books/Fiction/catalog.sqlite"), "catalog.sqlite"));
    }

    #[tokio::test]
    async fn test_catalog_change_triggers_reindex() {
        let fixture = CatalogFixture::new();
        let library = fixture.library("Fiction").await;
        library.add(FixtureBook::new("Mort").series("Discworld", 4.0).format("EPUB", "mort")).await;
        let index = Arc::new(CatalogIndex::new(fixture.root(), SourceOptions::default()));
        index.reindex().await.unwrap();
        let _watcher = CatalogWatcher::start(Arc::clone(&index), Duration::from_millis(100)).unwrap();

        library.add(FixtureBook::new("Sourcery").series("Discworld", 5.0).format("EPUB", "sourcery")).await;
        let path = "/Fiction/Discworld/Discworld - 05.epub";
        let mut found = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if index.resolve(path).is_some() {
                found = true;
                break;
            }
        }
        assert!(found, "{path} never appeared");
    }

    #[tokio::test]
    async fn test_drop_cancels_pending_reindex() {
        let fixture = CatalogFixture::new();
        let library = fixture.library("Fiction").await;
        library.add(FixtureBook::new("Mort").series("Discworld", 4.0).format("EPUB", "mort")).await;
        let index = Arc::new(CatalogIndex::new(fixture.root(), SourceOptions::default()));
        index.reindex().await.unwrap();
        let delay = Duration::from_secs(1);
        let watcher = CatalogWatcher::start(Arc::clone(&index), delay).unwrap();

        library.add(FixtureBook::new("Sourcery").series("Discworld", 5.0).format("EPUB", "sourcery")).await;
        let mut pending = false;
        for _ in 0..100 {
            if watcher.is_pending() {
                pending = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(pending, "catalog change was never noticed");
        drop(watcher);

        tokio::time::sleep(delay * 2).await;
        assert!(index.resolve("/Fiction/Discworld/Discworld - 05.epub").is_none());
        assert!(index.resolve("/Fiction/Discworld/Discworld - 04.epub").is_some());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let fixture = CatalogFixture::new();
        let index = Arc::new(CatalogIndex::new(fixture.root().join("missing"), SourceOptions::default()));
        let err = CatalogWatcher::start(index, DEFAULT_DEBOUNCE).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Watch(_)));
    }
}
