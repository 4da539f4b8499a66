//! Catalog fixtures for tests.
//!
//! Builds catalog databases (and the book files they point at) inside a
//! temporary directory, laid out the way a source root is expected to be:
//!
//! ```text
//! <root>/<library>/metadata.db
//! <root>/<library>/<book directory>/<file name>.<ext>
//! ```
//!
//! Every method panics on failure. Fixtures are for tests; if the test setup
//! is wrong, the test should not pass.

use crate::source::DEFAULT_CATALOG_FILE;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCHEMA: &str = include_str!("../fixtures/schema.sql");

/// A temporary source root.
pub struct CatalogFixture {
    dir: TempDir,
}
impl CatalogFixture {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("create temporary source root") }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a library directory with an empty catalog.
    pub async fn library(&self, name: &str) -> LibraryFixture {
        self.library_with_catalog(name, DEFAULT_CATALOG_FILE).await
    }

    /// Creates a library directory with an empty catalog under a custom
    /// file name.
    pub async fn library_with_catalog(&self, name: &str, file_name: &str) -> LibraryFixture {
        let dir = self.root().join(name);
        std::fs::create_dir_all(&dir).expect("create library directory");
        let library = LibraryFixture { catalog: dir.join(file_name), dir };
        let mut conn = library.connect().await;
        sqlx::raw_sql(SCHEMA).execute(&mut conn).await.expect("create catalog schema");
        conn.close().await.expect("close catalog");
        library
    }

    /// Creates a plain directory without a catalog.
    pub fn directory(&self, name: &str) -> PathBuf {
        let dir = self.root().join(name);
        std::fs::create_dir_all(&dir).expect("create directory");
        dir
    }
}
impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One library directory and its catalog.
pub struct LibraryFixture {
    dir: PathBuf,
    catalog: PathBuf,
}
impl LibraryFixture {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &Path {
        &self.catalog
    }

    async fn connect(&self) -> SqliteConnection {
        SqliteConnectOptions::new()
            .filename(&self.catalog)
            .create_if_missing(true)
            // Rollback journal, so that an exclusive lock keeps readers out.
            .journal_mode(SqliteJournalMode::Delete)
            .connect()
            .await
            .expect("open catalog")
    }

    /// Adds a book (one row per format) to the catalog and writes its files
    /// to disk. Returns the book's ID.
    pub async fn add(&self, book: FixtureBook) -> i64 {
        let mut conn = self.connect().await;
        let (next_id,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM books")
            .fetch_one(&mut conn)
            .await
            .expect("next book id");
        let directory = format!("{}/{} ({next_id})", book.author, book.title);
        sqlx::query(
            r#"
                INSERT INTO books (id, title, author_sort, path, series_index, timestamp, last_modified)
                VALUES (?, ?, ?, ?, ?, datetime(?, 'unixepoch') || '+00:00', datetime(?, 'unixepoch') || '+00:00')
            "#,
        )
        .bind(next_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&directory)
        .bind(book.series_index)
        .bind(book.created)
        .bind(book.modified)
        .execute(&mut conn)
        .await
        .expect("insert book");
        if let Some(series) = &book.series {
            sqlx::query("INSERT OR IGNORE INTO series (name, sort) VALUES (?, ?)")
                .bind(series)
                .bind(series)
                .execute(&mut conn)
                .await
                .expect("insert series");
            sqlx::query("INSERT INTO books_series_link (book, series) SELECT ?, id FROM series WHERE name = ?")
                .bind(next_id)
                .bind(series)
                .execute(&mut conn)
                .await
                .expect("link series");
        }
        let file_dir = self.dir.join(&directory);
        std::fs::create_dir_all(&file_dir).expect("create book directory");
        for (format, content) in &book.formats {
            sqlx::query("INSERT INTO data (book, format, uncompressed_size, name) VALUES (?, ?, ?, ?)")
                .bind(next_id)
                .bind(format)
                .bind(content.len() as i64)
                .bind(&book.file_name)
                .execute(&mut conn)
                .await
                .expect("insert data");
            let file = file_dir.join(format!("{}.{}", book.file_name, format.to_lowercase()));
            std::fs::write(file, content).expect("write book file");
        }
        conn.close().await.expect("close catalog");
        next_id
    }

    /// Runs arbitrary SQL against the catalog (for corrupting it on purpose).
    pub async fn execute(&self, sql: &str) {
        let mut conn = self.connect().await;
        sqlx::raw_sql(sql).execute(&mut conn).await.expect("execute statement");
        conn.close().await.expect("close catalog");
    }

    /// Takes an exclusive lock on the catalog, the same way a writer in the
    /// middle of a transaction would. Readers are locked out until the
    /// returned guard is released.
    pub async fn lock(&self) -> CatalogLock {
        let mut conn = self.connect().await;
        sqlx::query("BEGIN EXCLUSIVE").execute(&mut conn).await.expect("lock catalog");
        CatalogLock { conn }
    }

    /// Starts a write transaction and runs `sql` in it without committing,
    /// like a writer that is still in the middle of an update. Readers keep
    /// seeing the committed data until the returned guard is released.
    pub async fn write_pending(&self, sql: &str) -> CatalogLock {
        let mut conn = self.connect().await;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut conn).await.expect("begin write");
        sqlx::raw_sql(sql).execute(&mut conn).await.expect("execute statement");
        CatalogLock { conn }
    }
}

/// A transaction held open on a catalog. Releasing it commits.
pub struct CatalogLock {
    conn: SqliteConnection,
}
impl CatalogLock {
    pub async fn release(mut self) {
        sqlx::query("COMMIT").execute(&mut self.conn).await.expect("unlock catalog");
        self.conn.close().await.expect("close catalog");
    }
}

/// A book to add to a [`LibraryFixture`].
#[derive(Debug, Clone)]
pub struct FixtureBook {
    title: String,
    author: String,
    file_name: String,
    series: Option<String>,
    series_index: f64,
    formats: Vec<(String, Vec<u8>)>,
    created: i64,
    modified: i64,
}
impl FixtureBook {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            file_name: format!("{title} - Fixture Author"),
            title,
            author: "Fixture Author".to_string(),
            series: None,
            series_index: 1.0,
            formats: Vec::new(),
            created: 1_700_000_000,
            modified: 1_700_000_000,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// File name on disk, without extension.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn series(mut self, name: impl Into<String>, index: f64) -> Self {
        self.series = Some(name.into());
        self.series_index = index;
        self
    }

    /// Adds a file variant with the given catalog format code.
    pub fn format(mut self, code: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.formats.push((code.into(), content.into()));
        self
    }

    /// Unix timestamps for the creation and modification dates.
    pub fn dates(mut self, created: i64, modified: i64) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }
}
