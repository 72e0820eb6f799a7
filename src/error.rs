//! Error types for the smbsession library.

use thiserror::Error;

use crate::protocol::NtStatus;
use crate::session::SessionState;

/// Main error type for smbsession operations.
#[derive(Error, Debug)]
pub enum SmbError {
    /// Endpoint unreachable or connection lost. Fatal to the session.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server rejected the credentials.
    #[error("Authentication failed for {username}: {status}")]
    Auth { username: String, status: NtStatus },

    /// Share listing or attachment failed.
    #[error("Protocol error during {operation}: {status}")]
    Protocol {
        operation: &'static str,
        status: NtStatus,
    },

    /// Object could not be opened (missing, denied, sharing conflict).
    #[error("Failed to open {path}: {status}")]
    Open { path: String, status: NtStatus },

    /// Read failed mid-stream. Partial data is discarded.
    #[error("Failed to read {path}: {status}")]
    Read { path: String, status: NtStatus },

    /// Write rejected by the server.
    #[error("Failed to write {path}: {status}")]
    Write { path: String, status: NtStatus },

    /// Server accepted a write but stored nothing.
    #[error("Short write to {path} at offset {offset}")]
    ShortWrite { path: String, offset: u64 },

    /// Directory enumeration failed.
    #[error("Failed to enumerate {path}: {status}")]
    Enumerate { path: String, status: NtStatus },

    /// Marking for deletion or committing the deletion failed.
    #[error("Failed to delete {path}: {status}")]
    Delete { path: String, status: NtStatus },

    /// Handle close failed.
    #[error("Failed to close {path}: {status}")]
    Close { path: String, status: NtStatus },

    /// Session (or the attached share) has been torn down.
    #[error("Session closed")]
    SessionClosed,

    /// Operation not valid in the current session state.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Caller supplied a value the core refuses to send.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid or incomplete client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for smbsession operations.
pub type Result<T> = std::result::Result<T, SmbError>;

/// Per-object request kinds, used to pick the failure variant for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectOp {
    Open,
    Read,
    Write,
    Enumerate,
    Delete,
    Close,
}

impl SmbError {
    /// Map a non-success status from a per-object request to a typed failure.
    pub(crate) fn from_status(op: ObjectOp, path: &str, status: NtStatus) -> Self {
        if status.is_transport() {
            return SmbError::Transport(format!("{:?} {}: {}", op, path, status));
        }
        let path = path.to_string();
        match op {
            ObjectOp::Open => SmbError::Open { path, status },
            ObjectOp::Read => SmbError::Read { path, status },
            ObjectOp::Write => SmbError::Write { path, status },
            ObjectOp::Enumerate => SmbError::Enumerate { path, status },
            ObjectOp::Delete => SmbError::Delete { path, status },
            ObjectOp::Close => SmbError::Close { path, status },
        }
    }

    /// Server status carried by this error, if any.
    pub fn status(&self) -> Option<NtStatus> {
        match self {
            SmbError::Auth { status, .. }
            | SmbError::Protocol { status, .. }
            | SmbError::Open { status, .. }
            | SmbError::Read { status, .. }
            | SmbError::Write { status, .. }
            | SmbError::Enumerate { status, .. }
            | SmbError::Delete { status, .. }
            | SmbError::Close { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, SmbError::Transport(_))
    }

    /// Check if the session can no longer serve the request.
    ///
    /// True both for a torn-down session and for a state precondition
    /// (e.g. attaching a share before authenticating).
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            SmbError::SessionClosed | SmbError::InvalidState { .. }
        )
    }
}
