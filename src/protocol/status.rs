//! NT status codes returned by the file server.

use std::fmt;

/// Status codes a server can answer with.
///
/// Only the codes the session layer reacts to are named; everything else is
/// carried through as [`NtStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NtStatus {
    /// Operation completed
    Success,
    /// Read started at or past the end of the object
    EndOfFile,
    /// Enumeration has nothing more to return
    NoMoreFiles,
    /// Final path component does not exist
    ObjectNameNotFound,
    /// An intermediate path component does not exist
    ObjectPathNotFound,
    /// Object already exists
    ObjectNameCollision,
    /// Access denied
    AccessDenied,
    /// Another open conflicts with the requested sharing mode
    SharingViolation,
    /// Directory still has children
    DirectoryNotEmpty,
    /// Directory opened where a file was required
    FileIsADirectory,
    /// File opened where a directory was required
    NotADirectory,
    /// Object is already marked for deletion
    DeletePending,
    /// Malformed request
    InvalidParameter,
    /// Handle not known to the server
    InvalidHandle,
    /// Bad username or password
    LogonFailure,
    /// Share does not exist
    BadNetworkName,
    /// Handle was already closed
    FileClosed,
    /// Share was disconnected underneath the request
    NetworkNameDeleted,
    /// Transport connection was lost
    ConnectionDisconnected,
    /// Endpoint could not be reached
    HostUnreachable,
    /// Any other status
    Unknown(u32),
}

impl From<u32> for NtStatus {
    fn from(code: u32) -> Self {
        match code {
            0x0000_0000 => NtStatus::Success,
            0xC000_0011 => NtStatus::EndOfFile,
            0x8000_0006 => NtStatus::NoMoreFiles,
            0xC000_0034 => NtStatus::ObjectNameNotFound,
            0xC000_003A => NtStatus::ObjectPathNotFound,
            0xC000_0035 => NtStatus::ObjectNameCollision,
            0xC000_0022 => NtStatus::AccessDenied,
            0xC000_0043 => NtStatus::SharingViolation,
            0xC000_0101 => NtStatus::DirectoryNotEmpty,
            0xC000_00BA => NtStatus::FileIsADirectory,
            0xC000_0103 => NtStatus::NotADirectory,
            0xC000_0056 => NtStatus::DeletePending,
            0xC000_000D => NtStatus::InvalidParameter,
            0xC000_0008 => NtStatus::InvalidHandle,
            0xC000_006D => NtStatus::LogonFailure,
            0xC000_00CC => NtStatus::BadNetworkName,
            0xC000_0128 => NtStatus::FileClosed,
            0xC000_00C9 => NtStatus::NetworkNameDeleted,
            0xC000_020C => NtStatus::ConnectionDisconnected,
            0xC000_023D => NtStatus::HostUnreachable,
            other => NtStatus::Unknown(other),
        }
    }
}

impl NtStatus {
    /// Raw 32-bit status value.
    pub fn code(&self) -> u32 {
        match self {
            NtStatus::Success => 0x0000_0000,
            NtStatus::EndOfFile => 0xC000_0011,
            NtStatus::NoMoreFiles => 0x8000_0006,
            NtStatus::ObjectNameNotFound => 0xC000_0034,
            NtStatus::ObjectPathNotFound => 0xC000_003A,
            NtStatus::ObjectNameCollision => 0xC000_0035,
            NtStatus::AccessDenied => 0xC000_0022,
            NtStatus::SharingViolation => 0xC000_0043,
            NtStatus::DirectoryNotEmpty => 0xC000_0101,
            NtStatus::FileIsADirectory => 0xC000_00BA,
            NtStatus::NotADirectory => 0xC000_0103,
            NtStatus::DeletePending => 0xC000_0056,
            NtStatus::InvalidParameter => 0xC000_000D,
            NtStatus::InvalidHandle => 0xC000_0008,
            NtStatus::LogonFailure => 0xC000_006D,
            NtStatus::BadNetworkName => 0xC000_00CC,
            NtStatus::FileClosed => 0xC000_0128,
            NtStatus::NetworkNameDeleted => 0xC000_00C9,
            NtStatus::ConnectionDisconnected => 0xC000_020C,
            NtStatus::HostUnreachable => 0xC000_023D,
            NtStatus::Unknown(code) => *code,
        }
    }

    /// Get human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            NtStatus::Success => "Success",
            NtStatus::EndOfFile => "End of file",
            NtStatus::NoMoreFiles => "No more files",
            NtStatus::ObjectNameNotFound => "Object not found",
            NtStatus::ObjectPathNotFound => "Path not found",
            NtStatus::ObjectNameCollision => "Object already exists",
            NtStatus::AccessDenied => "Access denied",
            NtStatus::SharingViolation => "Sharing violation",
            NtStatus::DirectoryNotEmpty => "Directory not empty",
            NtStatus::FileIsADirectory => "Object is a directory",
            NtStatus::NotADirectory => "Object is not a directory",
            NtStatus::DeletePending => "Delete pending",
            NtStatus::InvalidParameter => "Invalid parameter",
            NtStatus::InvalidHandle => "Invalid handle",
            NtStatus::LogonFailure => "Logon failure",
            NtStatus::BadNetworkName => "Share not found",
            NtStatus::FileClosed => "Handle already closed",
            NtStatus::NetworkNameDeleted => "Share disconnected",
            NtStatus::ConnectionDisconnected => "Connection disconnected",
            NtStatus::HostUnreachable => "Host unreachable",
            NtStatus::Unknown(_) => "Unknown status",
        }
    }

    /// Whether the status means the transport itself is gone.
    ///
    /// These are fatal to the whole session, not just the current request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NtStatus::ConnectionDisconnected | NtStatus::HostUnreachable
        )
    }

    /// Whether the status marks the end of a data stream.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, NtStatus::EndOfFile | NtStatus::NoMoreFiles)
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.description(), self.code())
    }
}
