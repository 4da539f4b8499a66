mod book;
mod format;
mod library;
mod row;
mod series;

pub use self::book::Book;
pub use self::format::Format;
pub use self::library::Library;
pub(crate) use self::row::BookRow;
pub use self::series::{Admission, Series, SeriesBuilder};
