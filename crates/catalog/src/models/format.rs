use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Book file format, as recorded against each file variant in the catalog.
///
/// The set is closed: anything else in the catalog is a data-integrity fault
/// and fails the load of the library it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Azw3,
    Cbz,
    Epub,
    /// The untouched EPUB kept by the catalog after an in-place conversion.
    OriginalEpub,
    Mobi,
    Pdf,
    Zip,
}
impl Format {
    /// The format code as stored in the catalog database.
    pub fn as_code(&self) -> &'static str {
        match self {
            Format::Azw3 => "AZW3",
            Format::Cbz => "CBZ",
            Format::Epub => "EPUB",
            Format::OriginalEpub => "ORIGINAL_EPUB",
            Format::Mobi => "MOBI",
            Format::Pdf => "PDF",
            Format::Zip => "ZIP",
        }
    }

    /// File extension (without the leading dot) used on disk and in the
    /// virtual tree.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Azw3 => "azw3",
            Format::Cbz => "cbz",
            Format::Epub => "epub",
            Format::OriginalEpub => "original_epub",
            Format::Mobi => "mobi",
            Format::Pdf => "pdf",
            Format::Zip => "zip",
        }
    }
}
impl FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "AZW3" => Self::Azw3,
            "CBZ" => Self::Cbz,
            "EPUB" => Self::Epub,
            "ORIGINAL_EPUB" => Self::OriginalEpub,
            "MOBI" => Self::Mobi,
            "PDF" => Self::Pdf,
            "ZIP" => Self::Zip,
            // No lowercasing or fuzzy matching: the catalog writes these codes
            // itself, so anything else means the catalog is not what we think.
            other => exn::bail!(ErrorKind::UnsupportedFormat(other.to_string())),
        })
    }
}
impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_code())
    }
}
