//! # Libris Catalog
//!
//! In-memory index of ebook libraries, loaded from the SQLite catalog files
//! found under a single source root.
//!
//! ```text
//! <root>/
//! ├── Fiction/            ← library (has a catalog file)
//! │   ├── metadata.db
//! │   └── Terry Pratchett/Mort (4)/Mort - Terry Pratchett.epub
//! └── Comics/
//!     └── metadata.db
//! ```
//!
//! Each library is presented as a two-level tree of series and books, with
//! every book given a predictable name derived from its series and position:
//!
//! ```text
//! /Fiction/Discworld/Discworld - 04.epub
//! ```
//!
//! Loading is all-or-nothing per library: a library whose catalog can't be
//! read keeps serving whatever was loaded before.

pub mod error;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
mod index;
mod models;
pub mod naming;
mod path;
mod source;

pub use crate::index::{CatalogIndex, Node, Reindex};
pub use crate::models::{Admission, Book, Format, Library, Series, SeriesBuilder};
pub use crate::path::VirtualPath;
pub use crate::source::{DEFAULT_BUSY_TIMEOUT, DEFAULT_CATALOG_FILE, SourceOptions};
