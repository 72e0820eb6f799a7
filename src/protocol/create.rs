//! Create (open) request parameters.

use bitflags::bitflags;

use super::flags::{AccessMask, FileAttributes, ShareAccess};

/// What to do when the target does or does not already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateDisposition {
    /// Open an existing object, fail if missing
    OpenExisting,
    /// Create a new object, fail if present
    CreateNew,
    /// Open if present, otherwise create
    OpenOrCreate,
    /// Truncate if present, otherwise create
    OverwriteOrCreate,
}

impl CreateDisposition {
    /// Wire value of the disposition.
    pub fn code(&self) -> u32 {
        match self {
            CreateDisposition::OpenExisting => 1,
            CreateDisposition::CreateNew => 2,
            CreateDisposition::OpenOrCreate => 3,
            CreateDisposition::OverwriteOrCreate => 5,
        }
    }

    /// Whether the disposition may bring a new object into existence.
    pub fn may_create(&self) -> bool {
        !matches!(self, CreateDisposition::OpenExisting)
    }
}

/// Kind of object an open must resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    File,
    Directory,
}

bitflags! {
    /// Create options sent alongside the disposition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CreateOptions: u32 {
        const DIRECTORY_FILE = 0x0000_0001;
        const WRITE_THROUGH = 0x0000_0002;
        const SEQUENTIAL_ONLY = 0x0000_0004;
        const SYNCHRONOUS_IO_ALERT = 0x0000_0010;
        const SYNCHRONOUS_IO_NONALERT = 0x0000_0020;
        const NON_DIRECTORY_FILE = 0x0000_0040;
        const DELETE_ON_CLOSE = 0x0000_1000;
    }
}

impl ObjectKind {
    /// Create options that pin the open to this kind.
    pub fn create_options(&self) -> CreateOptions {
        match self {
            ObjectKind::File => {
                CreateOptions::NON_DIRECTORY_FILE | CreateOptions::SYNCHRONOUS_IO_ALERT
            }
            ObjectKind::Directory => CreateOptions::DIRECTORY_FILE,
        }
    }
}

/// A fully validated create request, ready for the transport.
///
/// Built only through [`crate::fs::OpenOptions`], so every request the
/// transport sees has already passed the disposition/kind checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Share-relative path in wire form (`\` separators, no leading separator)
    pub path: String,
    pub access: AccessMask,
    pub attributes: FileAttributes,
    pub share_access: ShareAccess,
    pub disposition: CreateDisposition,
    pub kind: ObjectKind,
    pub options: CreateOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_codes() {
        assert_eq!(CreateDisposition::OpenExisting.code(), 1);
        assert_eq!(CreateDisposition::CreateNew.code(), 2);
        assert_eq!(CreateDisposition::OpenOrCreate.code(), 3);
        assert_eq!(CreateDisposition::OverwriteOrCreate.code(), 5);
        assert!(!CreateDisposition::OpenExisting.may_create());
        assert!(CreateDisposition::OverwriteOrCreate.may_create());
    }

    #[test]
    fn test_kind_options() {
        let file = ObjectKind::File.create_options();
        assert!(file.contains(CreateOptions::NON_DIRECTORY_FILE));
        assert!(!file.contains(CreateOptions::DIRECTORY_FILE));
        assert_eq!(
            ObjectKind::Directory.create_options(),
            CreateOptions::DIRECTORY_FILE
        );
    }
}
