use crate::models::Format;
use std::path::PathBuf;
use time::UtcDateTime;

/// A single file variant of a book in the catalog.
///
/// Books are never modified after construction; the index only ever swaps
/// whole libraries in and out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub title: String,
    pub author: String,
    /// Name of the series this book is listed under (escaped).
    pub series: String,
    /// Position in the series, already formatted for display
    /// (see [`format_series_index`](crate::naming::format_series_index)).
    pub series_index: String,
    /// File name on disk without the extension (escaped).
    pub base_name: String,
    pub format: Format,
    /// Directory holding the file, relative to the library directory.
    pub directory: PathBuf,
    /// File size in bytes
    pub size: u64,
    pub created: UtcDateTime,
    pub modified: UtcDateTime,
}
impl Book {
    /// File name of the backing file on disk.
    pub fn physical_name(&self) -> String {
        format!("{}.{}", self.base_name, self.format.extension())
    }

    /// File name presented in the virtual tree, e.g. `Discworld - 03.epub`.
    pub fn virtual_name(&self) -> String {
        format!("{} - {}.{}", self.series, self.series_index, self.format.extension())
    }

    /// Path of the backing file, relative to the library directory.
    pub fn relative_path(&self) -> PathBuf {
        self.directory.join(self.physical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_book(format: Format) -> Book {
        Book {
            title: "Equal Rites".to_string(),
            author: "Pratchett, Terry".to_string(),
            series: "Discworld".to_string(),
            series_index: "03".to_string(),
            base_name: "Equal Rites - Terry Pratchett".to_string(),
            format,
            directory: PathBuf::from("Terry Pratchett/Equal Rites (3)"),
            size: 1024,
            created: UtcDateTime::UNIX_EPOCH,
            modified: UtcDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_physical_name() {
        let book = make_test_book(Format::Epub);
        assert_eq!(book.physical_name(), "Equal Rites - Terry Pratchett.epub");
        assert_eq!(
            book.relative_path(),
            PathBuf::from("Terry Pratchett/Equal Rites (3)/Equal Rites - Terry Pratchett.epub")
        );
    }

    #[test]
    fn test_virtual_name() {
        assert_eq!(make_test_book(Format::Epub).virtual_name(), "Discworld - 03.epub");
        assert_eq!(make_test_book(Format::OriginalEpub).virtual_name(), "Discworld - 03.original_epub");
    }
}
