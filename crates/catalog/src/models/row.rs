use crate::error::{Error, ErrorKind};
use crate::models::{Book, Format};
use crate::naming::{escape_file_name, format_series_index};
use exn::ResultExt;
use std::path::PathBuf;
use time::UtcDateTime;

/// One row of the library load query: a single file variant of a book,
/// joined with the series it belongs to (if any).
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) book_id: i64,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) directory: String,
    pub(crate) series_index: f64,
    pub(crate) created_at: i64,
    pub(crate) modified_at: i64,
    pub(crate) format: String,
    pub(crate) file_name: String,
    pub(crate) file_size: i64,
    #[sqlx(default)]
    pub(crate) series: Option<String>,
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let format = row.format.parse::<Format>()?;
        let base_name = escape_file_name(&row.file_name);
        // A book that isn't part of any series becomes a series of its own,
        // named after the book.
        let series = match row.series {
            Some(name) => escape_file_name(&name),
            None => base_name.clone(),
        };
        Ok(Self {
            title: row.title,
            author: row.author,
            series,
            series_index: format_series_index(row.series_index),
            base_name,
            format,
            directory: PathBuf::from(row.directory),
            size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            created: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
            modified: UtcDateTime::from_unix_timestamp(row.modified_at)
                .or_raise(|| ErrorKind::InvalidData("modification date"))?,
        })
    }
}
