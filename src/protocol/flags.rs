//! Bit-flag sets carried in create requests and directory listings.

use bitflags::bitflags;

bitflags! {
    /// Desired access requested when opening an object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMask: u32 {
        const FILE_READ_DATA = 0x0000_0001;
        const FILE_WRITE_DATA = 0x0000_0002;
        const FILE_APPEND_DATA = 0x0000_0004;
        const FILE_READ_EA = 0x0000_0008;
        const FILE_WRITE_EA = 0x0000_0010;
        const FILE_EXECUTE = 0x0000_0020;
        const FILE_READ_ATTRIBUTES = 0x0000_0080;
        const FILE_WRITE_ATTRIBUTES = 0x0000_0100;
        const DELETE = 0x0001_0000;
        const READ_CONTROL = 0x0002_0000;
        const WRITE_DAC = 0x0004_0000;
        const WRITE_OWNER = 0x0008_0000;
        const SYNCHRONIZE = 0x0010_0000;
        const GENERIC_ALL = 0x1000_0000;
        const GENERIC_EXECUTE = 0x2000_0000;
        const GENERIC_WRITE = 0x4000_0000;
        const GENERIC_READ = 0x8000_0000;

        // Directory-specific aliases
        const FILE_LIST_DIRECTORY = 0x0000_0001;
        const FILE_ADD_FILE = 0x0000_0002;
        const FILE_ADD_SUBDIRECTORY = 0x0000_0004;
        const FILE_TRAVERSE = 0x0000_0020;
        const FILE_DELETE_CHILD = 0x0000_0040;
    }
}

impl AccessMask {
    /// Check if the mask allows reading data or listing a directory.
    pub fn grants_read(&self) -> bool {
        self.intersects(
            AccessMask::FILE_READ_DATA | AccessMask::GENERIC_READ | AccessMask::GENERIC_ALL,
        )
    }

    /// Check if the mask allows writing data or adding children.
    pub fn grants_write(&self) -> bool {
        self.intersects(
            AccessMask::FILE_WRITE_DATA
                | AccessMask::FILE_APPEND_DATA
                | AccessMask::GENERIC_WRITE
                | AccessMask::GENERIC_ALL,
        )
    }

    /// Check if the mask allows marking the object for deletion.
    pub fn grants_delete(&self) -> bool {
        self.intersects(AccessMask::DELETE | AccessMask::GENERIC_ALL)
    }
}

bitflags! {
    /// Access other openers are allowed while this handle is open.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShareAccess: u32 {
        const READ = 0x0000_0001;
        const WRITE = 0x0000_0002;
        const DELETE = 0x0000_0004;
    }
}

bitflags! {
    /// Attributes of a remote object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileAttributes: u32 {
        const READONLY = 0x0000_0001;
        const HIDDEN = 0x0000_0002;
        const SYSTEM = 0x0000_0004;
        const DIRECTORY = 0x0000_0010;
        const ARCHIVE = 0x0000_0020;
        const DEVICE = 0x0000_0040;
        const NORMAL = 0x0000_0080;
        const TEMPORARY = 0x0000_0100;
        const SPARSE_FILE = 0x0000_0200;
        const REPARSE_POINT = 0x0000_0400;
        const COMPRESSED = 0x0000_0800;
        const OFFLINE = 0x0000_1000;
        const NOT_CONTENT_INDEXED = 0x0000_2000;
        const ENCRYPTED = 0x0000_4000;
    }
}
