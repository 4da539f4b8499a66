//! Virtual path parsing.
//!
//! The virtual tree is exactly three levels deep below the root:
//!
//! | Path                            | Segments | Meaning           |
//! |---------------------------------|----------|-------------------|
//! | `/`                             | 0        | root              |
//! | `/{library}`                    | 1        | library directory |
//! | `/{library}/{series}`           | 2        | series directory  |
//! | `/{library}/{series}/{book}`    | 3        | book file         |
//!
//! Parsing is purely syntactic. Whether a parsed path points at anything is
//! decided by the lookups on [`CatalogIndex`](crate::CatalogIndex),
//! [`Library`](crate::Library) and [`Series`](crate::Series), which only
//! ever match the exact depth they're responsible for.

/// A syntactically valid virtual path, split into its named segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualPath<'a> {
    Root,
    Library { library: &'a str },
    Series { library: &'a str, series: &'a str },
    Book { library: &'a str, series: &'a str, book: &'a str },
}
impl<'a> VirtualPath<'a> {
    /// Splits a slash-delimited path into a [`VirtualPath`].
    ///
    /// Returns `None` for anything that can never resolve: relative paths,
    /// empty segments (`//`, trailing slashes), and paths deeper than a book.
    ///
    /// ```
    /// use libris_catalog::VirtualPath;
    /// assert_eq!(VirtualPath::parse("/"), Some(VirtualPath::Root));
    /// assert_eq!(VirtualPath::parse("/Fiction"), Some(VirtualPath::Library { library: "Fiction" }));
    /// assert_eq!(VirtualPath::parse("/a/b/c/d"), None);
    /// assert_eq!(VirtualPath::parse("Fiction"), None);
    /// ```
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        if rest.is_empty() {
            return Some(Self::Root);
        }
        let segments = rest.split('/').collect::<Vec<_>>();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        match segments[..] {
            [library] => Some(Self::Library { library }),
            [library, series] => Some(Self::Series { library, series }),
            [library, series, book] => Some(Self::Book { library, series, book }),
            _ => None,
        }
    }

    /// Number of named segments below the root.
    pub fn depth(&self) -> usize {
        match self {
            Self::Root => 0,
            Self::Library { .. } => 1,
            Self::Series { .. } => 2,
            Self::Book { .. } => 3,
        }
    }

    /// The library segment, if the path is at least library-deep.
    pub fn library(&self) -> Option<&'a str> {
        match *self {
            Self::Root => None,
            Self::Library { library } | Self::Series { library, .. } | Self::Book { library, .. } => Some(library),
        }
    }

    /// The series segment, if the path is at least series-deep.
    pub fn series(&self) -> Option<&'a str> {
        match *self {
            Self::Series { series, .. } | Self::Book { series, .. } => Some(series),
            _ => None,
        }
    }

    /// The book segment, if the path is book-deep.
    pub fn book(&self) -> Option<&'a str> {
        match *self {
            Self::Book { book, .. } => Some(book),
            _ => None,
        }
    }
}
