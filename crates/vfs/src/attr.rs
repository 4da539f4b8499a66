//! Attribute, listing and volume types handed back to the dispatcher.

use time::UtcDateTime;

/// Permission bits for every directory: read and traverse for everyone.
pub const DIRECTORY_PERMISSIONS: u16 = 0o555;
/// Permission bits for every book: read for everyone.
pub const FILE_PERMISSIONS: u16 = 0o444;
/// Longest file name the volume reports supporting.
pub const NAME_MAX: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    File,
}

/// Attributes of a single entry in the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    pub kind: FileKind,
    /// Size in bytes; always 0 for directories.
    pub size: u64,
    pub permissions: u16,
    /// Hard link count. Directories count `.`, their entry in the parent,
    /// and one per immediate child.
    pub links: u32,
    pub created: UtcDateTime,
    pub modified: UtcDateTime,
}
impl FileAttr {
    pub(crate) fn directory(children: usize, created: UtcDateTime, modified: UtcDateTime) -> Self {
        Self {
            kind: FileKind::Directory,
            size: 0,
            permissions: DIRECTORY_PERMISSIONS,
            links: u32::try_from(children).unwrap_or(u32::MAX - 2).saturating_add(2),
            created,
            modified,
        }
    }

    pub(crate) fn file(size: u64, created: UtcDateTime, modified: UtcDateTime) -> Self {
        Self {
            kind: FileKind::File,
            size,
            permissions: FILE_PERMISSIONS,
            links: 1,
            created,
            modified,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileKind,
}
impl DirEntry {
    pub(crate) fn directory(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FileKind::Directory }
    }

    pub(crate) fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FileKind::File }
    }
}

/// Volume statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeStats {
    /// Cumulative size of every book.
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub files: u64,
    pub directories: u64,
    pub name_max: u32,
    pub read_only: bool,
}

/// Access mode requested when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}
impl Access {
    /// Decodes POSIX `open(2)` flags.
    ///
    /// Appending, truncating and creating are all writes, whatever the access
    /// mode bits say.
    pub fn from_flags(flags: i32) -> Self {
        let access = match flags & libc::O_ACCMODE {
            libc::O_WRONLY => Self::Write,
            libc::O_RDWR => Self::ReadWrite,
            _ => Self::Read,
        };
        if access == Self::Read && flags & (libc::O_APPEND | libc::O_TRUNC | libc::O_CREAT) != 0 {
            Self::Write
        } else {
            access
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Read)
    }
}
