//! Directory entry types.

use crate::protocol::FileAttributes;
use crate::transport::RawEntry;

use super::path::is_dot_entry;

/// Kind of a directory entry, resolved once from its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory (including `.` and `..`)
    Directory,
    /// Device, reparse point, or anything else that is not a plain file
    Other,
}

impl EntryKind {
    /// Classify from the attributes reported by the server.
    pub fn from_attributes(attributes: FileAttributes) -> Self {
        if attributes.contains(FileAttributes::DIRECTORY) {
            EntryKind::Directory
        } else if attributes.intersects(FileAttributes::DEVICE | FileAttributes::REPARSE_POINT) {
            EntryKind::Other
        } else {
            EntryKind::File
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Entry name (no directory prefix)
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes (0 for directories)
    pub size: u64,
    pub attributes: FileAttributes,
}

impl DirectoryEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this is the `.` or `..` pseudo-entry.
    pub fn is_dot(&self) -> bool {
        is_dot_entry(&self.name)
    }
}

impl From<RawEntry> for DirectoryEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            kind: EntryKind::from_attributes(raw.attributes),
            size: raw.end_of_file,
            attributes: raw.attributes,
            name: raw.file_name,
        }
    }
}

/// Iterator adapter helpers over listings.
pub trait EntriesExt {
    /// Drop the `.` and `..` pseudo-entries, keeping server order.
    fn without_dots(self) -> Vec<DirectoryEntry>;
}

impl EntriesExt for Vec<DirectoryEntry> {
    fn without_dots(self) -> Vec<DirectoryEntry> {
        self.into_iter().filter(|e| !e.is_dot()).collect()
    }
}
