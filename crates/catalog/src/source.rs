//! Read-only access to a library's catalog database.

use crate::error::{ErrorKind, Result};
use crate::models::{Admission, Book, BookRow, Series, SeriesBuilder};
use exn::ResultExt;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// Default catalog file name looked for in each library directory.
pub const DEFAULT_CATALOG_FILE: &str = "metadata.db";
/// Default time to wait for a writer to release its lock on the catalog.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

// SQLite primary result codes that mean "somebody else is holding the
// database right now". Extended codes carry the primary code in the low byte.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Options shared by every catalog source opened by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Name of the catalog file inside each library directory.
    pub file_name: String,
    /// How long a read waits on a lock held by a concurrent writer.
    pub busy_timeout: Duration,
}
impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_CATALOG_FILE.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// A single library's catalog database.
#[derive(Debug, Clone)]
pub(crate) struct CatalogSource {
    path: PathBuf,
    busy_timeout: Duration,
}
impl CatalogSource {
    pub(crate) fn new(library_dir: impl AsRef<Path>, options: &SourceOptions) -> Self {
        Self {
            path: library_dir.as_ref().join(&options.file_name),
            busy_timeout: options.busy_timeout,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Connection options for reading a catalog that its owning application
    /// may be writing to at the same time.
    fn options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            // Never create an empty catalog where there wasn't one.
            .create_if_missing(false)
            .read_only(true)
            // Journal mode is left alone: switching it needs a
            // write lock, and the catalog belongs to someone else.
            .busy_timeout(self.busy_timeout)
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        self.options()
            .connect()
            .await
            .or_raise(|| ErrorKind::SourceUnavailable(self.path.clone()))
    }

    fn is_locked(err: &sqlx::Error) -> bool {
        let sqlx::Error::Database(db) = err else {
            return false;
        };
        db.code()
            .and_then(|code| code.parse::<i64>().ok())
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
    }

    fn classify(&self, err: &sqlx::Error) -> ErrorKind {
        if Self::is_locked(err) {
            ErrorKind::SourceUnavailable(self.path.clone())
        } else {
            ErrorKind::Database
        }
    }

    /// Runs the library query and groups its rows into series.
    ///
    /// Rows arrive ordered by book, so when two rows share a title and format
    /// within a series the one belonging to the older book wins. The returned
    /// series are in name order and their books in virtual name order.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub(crate) async fn load(&self) -> Result<Vec<Series>> {
        let mut conn = self.connect().await?;
        let mut grouped: BTreeMap<String, SeriesBuilder> = BTreeMap::new();
        {
            let mut rows = sqlx::query_as::<_, BookRow>(include_str!("../queries/load_library.sql")).fetch(&mut conn);
            loop {
                let row = match rows.try_next().await {
                    Ok(Some(row)) => row,
                    Ok(None) => break,
                    Err(err) => {
                        let kind = self.classify(&err);
                        return Err(err).or_raise(|| kind);
                    },
                };
                let book_id = row.book_id;
                let book = Book::try_from(row)?;
                let builder = grouped
                    .entry(book.series.clone())
                    .or_insert_with(|| SeriesBuilder::new(book.series.clone()));
                match builder.push(book) {
                    Admission::Accepted => {},
                    Admission::Duplicate => {
                        tracing::debug!(book_id, series = builder.name(), "Skipping duplicate title and format");
                    },
                    Admission::NameCollision => {
                        tracing::warn!(book_id, series = builder.name(), "Skipping book with clashing series position");
                    },
                }
            }
        }
        // Nothing was written, a failed close has no consequences for the data.
        _ = conn.close().await;
        Ok(grouped.into_values().map(SeriesBuilder::build).collect())
    }
}
