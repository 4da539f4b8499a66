use crate::models::{Book, Format};
use crate::path::VirtualPath;
use std::collections::HashSet;
use std::sync::Arc;
use time::UtcDateTime;

/// A named, ordered group of books within a library.
///
/// Books are always sorted by their virtual name (ordinal comparison) and
/// virtual names are unique within a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    name: String,
    books: Vec<Arc<Book>>,
}
impl Series {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Books in virtual name order.
    pub fn books(&self) -> &[Arc<Book>] {
        &self.books
    }

    /// Finds a book by its virtual name.
    pub fn book(&self, virtual_name: &str) -> Option<&Arc<Book>> {
        self.books.iter().find(|b| b.virtual_name() == virtual_name)
    }

    /// Finds the book a virtual path points at.
    ///
    /// Only book paths (`/{library}/{series}/{book}`) whose series segment is
    /// this series can match; shallower paths never do.
    pub fn get_book(&self, path: &str) -> Option<&Arc<Book>> {
        match VirtualPath::parse(path)? {
            VirtualPath::Book { series, book, .. } if series == self.name => self.book(book),
            _ => None,
        }
    }

    /// Sum of the recorded sizes of every book in the series.
    pub fn volume(&self) -> u64 {
        self.books.iter().map(|b| b.size).sum()
    }

    /// Most recent modification time of any book in the series.
    pub fn modified(&self) -> UtcDateTime {
        self.books.iter().map(|b| b.modified).max().unwrap_or(UtcDateTime::UNIX_EPOCH)
    }

    /// Earliest creation time of any book in the series.
    pub fn created(&self) -> UtcDateTime {
        self.books.iter().map(|b| b.created).min().unwrap_or(UtcDateTime::UNIX_EPOCH)
    }
}

/// Outcome of offering a book to a [`SeriesBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Another row with the same title and format was seen first.
    Duplicate,
    /// A different book already claimed the same virtual name.
    NameCollision,
}

/// Accumulates catalog rows for one series, enforcing that the first row for
/// any `(title, format)` pair wins.
#[derive(Debug)]
pub struct SeriesBuilder {
    name: String,
    books: Vec<Book>,
    seen: HashSet<(String, Format)>,
    names: HashSet<String>,
}
impl SeriesBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            books: Vec::new(),
            seen: HashSet::new(),
            names: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, book: Book) -> Admission {
        if self.seen.contains(&(book.title.clone(), book.format)) {
            return Admission::Duplicate;
        }
        let virtual_name = book.virtual_name();
        if self.names.contains(&virtual_name) {
            return Admission::NameCollision;
        }
        self.seen.insert((book.title.clone(), book.format));
        self.names.insert(virtual_name);
        self.books.push(book);
        Admission::Accepted
    }

    pub fn build(self) -> Series {
        let mut books = self.books;
        books.sort_by_cached_key(Book::virtual_name);
        Series {
            name: self.name,
            books: books.into_iter().map(Arc::new).collect(),
        }
    }
}
