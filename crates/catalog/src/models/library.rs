use crate::models::{Book, Series};
use crate::path::VirtualPath;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::UtcDateTime;

/// A top-level collection of series, loaded from one catalog file.
///
/// Series are always sorted by name (ordinal comparison).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    name: String,
    directory: PathBuf,
    series: Vec<Arc<Series>>,
}
impl Library {
    /// Create a library from its series, in any order.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>, series: impl IntoIterator<Item = Series>) -> Self {
        let mut series = series.into_iter().collect::<Vec<_>>();
        series.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            name: name.into(),
            directory: directory.into(),
            series: series.into_iter().map(Arc::new).collect(),
        }
    }

    /// Library name, taken from the name of its source directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the source directory the catalog was loaded from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Series in name order.
    pub fn series(&self) -> &[Arc<Series>] {
        &self.series
    }

    /// Finds a series by name.
    pub fn series_named(&self, name: &str) -> Option<&Arc<Series>> {
        self.series
            .binary_search_by(|s| s.name().cmp(name))
            .ok()
            .map(|i| &self.series[i])
    }

    /// Finds the series a virtual path points at (or into).
    ///
    /// Library-deep paths never match; series and book paths match on their
    /// series segment, provided the library segment is this library.
    pub fn get_series(&self, path: &str) -> Option<&Arc<Series>> {
        let path = VirtualPath::parse(path)?;
        if path.depth() < 2 || path.library()? != self.name {
            return None;
        }
        self.series_named(path.series()?)
    }

    pub fn book_count(&self) -> usize {
        self.series.iter().map(|s| s.books().len()).sum()
    }

    /// Sum of the recorded sizes of every book in the library.
    pub fn volume(&self) -> u64 {
        self.series.iter().map(|s| s.volume()).sum()
    }

    /// Absolute path of a book's backing file.
    pub fn physical_path(&self, book: &Book) -> PathBuf {
        self.directory.join(book.relative_path())
    }

    pub fn modified(&self) -> UtcDateTime {
        self.series.iter().map(|s| s.modified()).max().unwrap_or(UtcDateTime::UNIX_EPOCH)
    }

    pub fn created(&self) -> UtcDateTime {
        self.series
            .iter()
            .filter(|s| !s.books().is_empty())
            .map(|s| s.created())
            .min()
            .unwrap_or(UtcDateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Format, SeriesBuilder};

    fn make_test_series(name: &str, titles: &[&str]) -> Series {
        let mut builder = SeriesBuilder::new(name);
        for (i, title) in titles.iter().enumerate() {
            builder.push(Book {
                title: title.to_string(),
                author: "Author".to_string(),
                series: name.to_string(),
                series_index: format!("{:02}", i + 1),
                base_name: title.to_string(),
                format: Format::Epub,
                directory: PathBuf::from(format!("Author/{title}")),
                size: 10,
                created: UtcDateTime::from_unix_timestamp(100 + i as i64).unwrap(),
                modified: UtcDateTime::from_unix_timestamp(200 + i as i64).unwrap(),
            });
        }
        builder.build()
    }

    #[test]
    fn test_series_sorted_by_name() {
        let library = Library::new(
            "Fiction",
            "/books/Fiction",
            [
                make_test_series("Wheel of Time", &["Eye"]),
                make_test_series("Discworld", &["Mort"]),
                make_test_series("Earthsea", &["Wizard"]),
            ],
        );
        let names = library.series().iter().map(|s| s.name()).collect::<Vec<_>>();
        assert_eq!(names, ["Discworld", "Earthsea", "Wheel of Time"]);
    }

    #[test]
    fn test_get_series_is_depth_gated() {
        let library = Library::new("Fiction", "/books/Fiction", [make_test_series("Discworld", &["Mort"])]);
        assert!(library.get_series("/Fiction/Discworld").is_some());
        assert!(library.get_series("/Fiction/Discworld/Discworld - 01.epub").is_some());
        // Series named like the library, or a path too shallow to hold a series.
        assert!(library.get_series("/Discworld").is_none());
        assert!(library.get_series("/Fiction").is_none());
        assert!(library.get_series("/Other/Discworld").is_none());
        assert!(library.get_series("/Fiction/Earthsea").is_none());
    }

    #[test]
    fn test_aggregates() {
        let library = Library::new(
            "Fiction",
            "/books/Fiction",
            [make_test_series("Discworld", &["Mort", "Sourcery"]), make_test_series("Earthsea", &["Wizard"])],
        );
        assert_eq!(library.book_count(), 3);
        assert_eq!(library.volume(), 30);
        assert_eq!(library.modified().unix_timestamp(), 201);
        assert_eq!(library.created().unix_timestamp(), 100);
        let book = &library.series()[0].books()[0];
        assert_eq!(library.physical_path(book), PathBuf::from("/books/Fiction/Author/Mort/Mort.epub"));
    }
}
