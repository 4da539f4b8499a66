//! Request/response adapter between a filesystem dispatcher and the index.

use crate::attr::{Access, DirEntry, FileAttr, NAME_MAX, VolumeStats};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use libris_catalog::{CatalogIndex, Node};
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use time::UtcDateTime;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::instrument;

/// The read-only virtual filesystem.
///
/// Holds no per-file or per-handle state: every call resolves its path
/// against whatever snapshot the index is serving at that moment, so calls
/// can be made concurrently from any number of tasks.
#[derive(Debug, Clone)]
pub struct Filesystem {
    index: Arc<CatalogIndex>,
}
impl Filesystem {
    pub fn new(index: Arc<CatalogIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    fn resolve(&self, path: &str) -> Result<Node> {
        self.index.resolve(path).ok_or_else(|| not_found(path))
    }

    pub fn get_attributes(&self, path: &str) -> Result<FileAttr> {
        Ok(match self.resolve(path)? {
            Node::Root => {
                let libraries = self.index.libraries();
                let modified = libraries.iter().map(|l| l.modified()).max();
                let created = libraries.iter().filter(|l| l.book_count() > 0).map(|l| l.created()).min();
                FileAttr::directory(
                    libraries.len(),
                    created.unwrap_or(UtcDateTime::UNIX_EPOCH),
                    modified.unwrap_or(UtcDateTime::UNIX_EPOCH),
                )
            },
            Node::Library(library) => FileAttr::directory(library.series().len(), library.created(), library.modified()),
            Node::Series(_, series) => FileAttr::directory(series.books().len(), series.created(), series.modified()),
            Node::Book(_, _, book) => FileAttr::file(book.size, book.created, book.modified),
        })
    }

    /// Checks that a book can be opened with the given `open(2)` flags.
    ///
    /// Nothing is allocated; the caller doesn't need to release anything.
    pub fn open(&self, path: &str, flags: i32) -> Result<()> {
        if Access::from_flags(flags).is_write() {
            exn::bail!(ErrorKind::PermissionDenied(path.to_string()));
        }
        match self.resolve(path)? {
            Node::Book(..) => Ok(()),
            _ => Err(not_found(path)),
        }
    }

    pub fn open_directory(&self, path: &str) -> Result<()> {
        match self.resolve(path)? {
            Node::Book(..) => Err(not_found(path)),
            _ => Ok(()),
        }
    }

    /// Reads up to `length` bytes of a book, starting at `offset`.
    ///
    /// Reading at or past the end of the book returns no bytes. The backing
    /// file is opened, read and closed again within this call.
    #[instrument(level = "trace", skip(self))]
    pub async fn read(&self, path: &str, offset: u64, length: usize) -> Result<Vec<u8>> {
        let Node::Book(library, _, book) = self.resolve(path)? else {
            return Err(not_found(path));
        };
        if offset >= book.size || length == 0 {
            return Ok(Vec::new());
        }
        let physical = library.physical_path(&book);
        let wanted = (length as u64).min(book.size - offset);
        read_range(&physical, offset, wanted).await.inspect_err(|err| {
            tracing::warn!(path, physical = %physical.display(), error = ?err, "Backing file unreadable");
        })
    }

    /// Lists a directory: `.` and `..` first, then the children in index
    /// order.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let mut entries = vec![DirEntry::directory("."), DirEntry::directory("..")];
        match self.resolve(path)? {
            Node::Root => {
                entries.extend(self.index.libraries().iter().map(|l| DirEntry::directory(l.name())));
            },
            Node::Library(library) => {
                entries.extend(library.series().iter().map(|s| DirEntry::directory(s.name())));
            },
            Node::Series(_, series) => {
                entries.extend(series.books().iter().map(|b| DirEntry::file(b.virtual_name())));
            },
            Node::Book(..) => return Err(not_found(path)),
        }
        Ok(entries)
    }

    pub fn stat_volume(&self) -> VolumeStats {
        let libraries = self.index.libraries();
        let series = libraries.iter().map(|l| l.series().len() as u64).sum::<u64>();
        VolumeStats {
            total_bytes: self.index.volume(),
            free_bytes: 0,
            available_bytes: 0,
            files: libraries.iter().map(|l| l.book_count() as u64).sum(),
            directories: 1 + libraries.len() as u64 + series,
            name_max: NAME_MAX,
            read_only: true,
        }
    }

    pub fn write(&self, path: &str, _offset: u64, _data: &[u8]) -> Result<usize> {
        reject("write", path)
    }

    pub fn create(&self, path: &str) -> Result<()> {
        reject("create", path)
    }

    pub fn make_directory(&self, path: &str) -> Result<()> {
        reject("mkdir", path)
    }

    pub fn remove(&self, path: &str) -> Result<()> {
        reject("remove", path)
    }

    pub fn remove_directory(&self, path: &str) -> Result<()> {
        reject("rmdir", path)
    }

    pub fn rename(&self, from: &str, _to: &str) -> Result<()> {
        reject("rename", from)
    }

    pub fn truncate(&self, path: &str, _size: u64) -> Result<()> {
        reject("truncate", path)
    }

    pub fn set_times(&self, path: &str, _modified: UtcDateTime) -> Result<()> {
        reject("set times", path)
    }

    pub fn get_xattr(&self, path: &str, _name: &str) -> Result<Vec<u8>> {
        unsupported("getxattr", path)
    }

    pub fn set_xattr(&self, path: &str, _name: &str, _value: &[u8]) -> Result<()> {
        unsupported("setxattr", path)
    }

    pub fn list_xattr(&self, path: &str) -> Result<Vec<String>> {
        unsupported("listxattr", path)
    }

    pub fn remove_xattr(&self, path: &str, _name: &str) -> Result<()> {
        unsupported("removexattr", path)
    }
}

fn not_found(path: &str) -> Error {
    Error::from(ErrorKind::NotFound(path.to_string()))
}

fn reject<T>(operation: &'static str, path: &str) -> Result<T> {
    tracing::debug!(operation, path, "Rejecting modification of read-only filesystem");
    exn::bail!(ErrorKind::ReadOnly)
}

fn unsupported<T>(operation: &'static str, path: &str) -> Result<T> {
    tracing::debug!(operation, path, "Rejecting extended attribute operation");
    exn::bail!(ErrorKind::NotSupported)
}

async fn read_range(physical: &Path, offset: u64, length: u64) -> Result<Vec<u8>> {
    let unreadable = || ErrorKind::BackingFile(physical.to_path_buf());
    let mut file = fs::File::open(physical).await.or_raise(unreadable)?;
    file.seek(SeekFrom::Start(offset)).await.or_raise(unreadable)?;
    let mut buffer = Vec::with_capacity(length as usize);
    file.take(length).read_to_end(&mut buffer).await.or_raise(unreadable)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::FileKind;
    use libris_catalog::SourceOptions;
    use libris_catalog::fixture::{CatalogFixture, FixtureBook};
    use rstest::rstest;

    const MORT: &[u8] = b"Death takes an apprentice.";

    async fn make_test_filesystem() -> (CatalogFixture, Filesystem) {
        let fixture = CatalogFixture::new();
        let library = fixture.library("Fiction").await;
        library
            .add(
                FixtureBook::new("The Colour of Magic")
                    .series("Discworld", 1.0)
                    .format("EPUB", "colour")
                    .dates(1_000, 2_000),
            )
            .await;
        library
            .add(FixtureBook::new("Mort").series("Discworld", 4.0).format("EPUB", MORT).dates(3_000, 4_000))
            .await;
        library.add(FixtureBook::new("A Wizard of Earthsea").series("Earthsea", 1.0).format("PDF", "wizard")).await;
        fixture.library("Comics").await;
        let index = Arc::new(CatalogIndex::new(fixture.root(), SourceOptions::default()));
        index.reindex().await.unwrap();
        (fixture, Filesystem::new(index))
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_attributes() {
        let (_fixture, fs) = make_test_filesystem().await;
        let root = fs.get_attributes("/").unwrap();
        assert!(root.is_dir());
        assert_eq!(root.links, 4);
        let library = fs.get_attributes("/Fiction").unwrap();
        assert_eq!(library.links, 4);
        assert_eq!(library.permissions, 0o555);
        let series = fs.get_attributes("/Fiction/Discworld").unwrap();
        assert_eq!(series.links, 4);
        assert_eq!(series.created.unix_timestamp(), 1_000);
        assert_eq!(series.modified.unix_timestamp(), 4_000);
        let book = fs.get_attributes("/Fiction/Discworld/Discworld - 04.epub").unwrap();
        assert_eq!(book.kind, FileKind::File);
        assert_eq!(book.size, MORT.len() as u64);
        assert_eq!(book.permissions, 0o444);
        assert_eq!(book.created.unix_timestamp(), 3_000);
        assert_eq!(book.modified.unix_timestamp(), 4_000);
        // Empty library.
        let comics = fs.get_attributes("/Comics").unwrap();
        assert_eq!(comics.links, 2);
        assert_eq!(comics.modified, UtcDateTime::UNIX_EPOCH);
    }

    #[rstest]
    #[case("/Missing")]
    #[case("/Fiction/Missing")]
    #[case("/Fiction/Discworld/Discworld - 09.epub")]
    #[case("/Discworld")]
    #[case("/Fiction/Discworld/Discworld - 04.epub/extra")]
    #[case("relative")]
    #[tokio::test]
    async fn test_unresolved_is_not_found(#[case] path: &str) {
        let (_fixture, fs) = make_test_filesystem().await;
        let err = fs.get_attributes(path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == path));
        assert_eq!(err.errno(), libc::ENOENT);
        assert!(matches!(&*fs.list_directory(path).unwrap_err(), ErrorKind::NotFound(_)));
        assert!(matches!(&*fs.open_directory(path).unwrap_err(), ErrorKind::NotFound(_)));
        assert!(matches!(&*fs.open(path, libc::O_RDONLY).unwrap_err(), ErrorKind::NotFound(_)));
        assert!(matches!(&*fs.read(path, 0, 10).await.unwrap_err(), ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_directory() {
        let (_fixture, fs) = make_test_filesystem().await;
        assert_eq!(names(&fs.list_directory("/").unwrap()), [".", "..", "Comics", "Fiction"]);
        assert_eq!(names(&fs.list_directory("/Fiction").unwrap()), [".", "..", "Discworld", "Earthsea"]);
        let books = fs.list_directory("/Fiction/Discworld").unwrap();
        assert_eq!(names(&books), [".", "..", "Discworld - 01.epub", "Discworld - 04.epub"]);
        assert!(books[2..].iter().all(|e| e.kind == FileKind::File));
        assert_eq!(names(&fs.list_directory("/Comics").unwrap()), [".", ".."]);
        let err = fs.list_directory("/Fiction/Discworld/Discworld - 01.epub").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_root_lists_only_dots() {
        let fixture = CatalogFixture::new();
        let index = Arc::new(CatalogIndex::new(fixture.root(), SourceOptions::default()));
        index.reindex().await.unwrap();
        let fs = Filesystem::new(index);
        assert_eq!(names(&fs.list_directory("/").unwrap()), [".", ".."]);
        assert_eq!(fs.stat_volume().total_bytes, 0);
    }

    #[tokio::test]
    async fn test_open() {
        let (_fixture, fs) = make_test_filesystem().await;
        let book = "/Fiction/Discworld/Discworld - 04.epub";
        fs.open(book, libc::O_RDONLY).unwrap();
        for flags in [libc::O_WRONLY, libc::O_RDWR, libc::O_RDONLY | libc::O_TRUNC] {
            let err = fs.open(book, flags).unwrap_err();
            assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
            assert_eq!(err.errno(), libc::EACCES);
        }
        assert!(matches!(&*fs.open("/Fiction/Discworld", libc::O_RDONLY).unwrap_err(), ErrorKind::NotFound(_)));
        fs.open_directory("/").unwrap();
        fs.open_directory("/Fiction").unwrap();
        fs.open_directory("/Fiction/Discworld").unwrap();
        assert!(matches!(&*fs.open_directory(book).unwrap_err(), ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read() {
        let (_fixture, fs) = make_test_filesystem().await;
        let book = "/Fiction/Discworld/Discworld - 04.epub";
        let size = MORT.len() as u64;
        assert_eq!(fs.read(book, 0, 4096).await.unwrap(), MORT);
        assert_eq!(fs.read(book, 0, MORT.len()).await.unwrap(), MORT);
        assert_eq!(fs.read(book, 6, 5).await.unwrap(), b"takes");
        assert_eq!(fs.read(book, size - 1, 100).await.unwrap(), b".");
        // End of file is not an error.
        assert!(fs.read(book, size, 100).await.unwrap().is_empty());
        assert!(fs.read(book, size + 100, 100).await.unwrap().is_empty());
        assert!(fs.read(book, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_reads() {
        let (_fixture, fs) = make_test_filesystem().await;
        let book = "/Fiction/Discworld/Discworld - 04.epub";
        let reads = (0..MORT.len() as u64).map(|offset| fs.read(book, offset, 1));
        let bytes = futures::future::join_all(reads)
            .await
            .into_iter()
            .flat_map(|r| r.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(bytes, MORT);
    }

    #[tokio::test]
    async fn test_missing_backing_file() {
        let (fixture, fs) = make_test_filesystem().await;
        let Some(Node::Book(library, _, book)) = fs.index().resolve("/Fiction/Discworld/Discworld - 04.epub") else {
            panic!("book not found");
        };
        std::fs::remove_file(library.physical_path(&book)).unwrap();
        let err = fs.read("/Fiction/Discworld/Discworld - 04.epub", 0, 10).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackingFile(p) if p.starts_with(fixture.root())));
        assert_eq!(err.errno(), libc::EIO);
        // Still past the end of the recorded size: EOF, no file access needed.
        assert!(fs.read("/Fiction/Discworld/Discworld - 04.epub", 1_000, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stat_volume() {
        let (_fixture, fs) = make_test_filesystem().await;
        let stats = fs.stat_volume();
        assert_eq!(stats.total_bytes, ("colour".len() + MORT.len() + "wizard".len()) as u64);
        assert_eq!(stats.files, 3);
        // Root, two libraries, two series.
        assert_eq!(stats.directories, 5);
        assert_eq!(stats.free_bytes, 0);
        assert_eq!(stats.name_max, 255);
        assert!(stats.read_only);
    }

    #[tokio::test]
    async fn test_modifications_are_rejected() {
        let (_fixture, fs) = make_test_filesystem().await;
        let book = "/Fiction/Discworld/Discworld - 04.epub";
        let read_only = [
            fs.write(book, 0, b"x").map(drop).unwrap_err(),
            fs.create("/Fiction/Discworld/new.epub").unwrap_err(),
            fs.make_directory("/Fiction/New").unwrap_err(),
            fs.remove(book).unwrap_err(),
            fs.remove_directory("/Fiction/Discworld").unwrap_err(),
            fs.rename(book, "/Fiction/Discworld/renamed.epub").unwrap_err(),
            fs.truncate(book, 0).unwrap_err(),
            fs.set_times(book, UtcDateTime::UNIX_EPOCH).unwrap_err(),
        ];
        for err in read_only {
            assert!(matches!(&*err, ErrorKind::ReadOnly));
            assert_eq!(err.errno(), libc::EROFS);
        }
        let unsupported = [
            fs.get_xattr(book, "user.test").map(drop).unwrap_err(),
            fs.set_xattr(book, "user.test", b"x").unwrap_err(),
            fs.list_xattr(book).map(drop).unwrap_err(),
            fs.remove_xattr(book, "user.test").unwrap_err(),
        ];
        for err in unsupported {
            assert!(matches!(&*err, ErrorKind::NotSupported));
        }
        // Nothing changed on disk.
        assert_eq!(fs.read(book, 0, 4096).await.unwrap(), MORT);
    }
}
