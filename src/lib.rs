//! # smbsession
//!
//! Client-side session manager for SMB2-style remote file shares.
//!
//! ## Features
//!
//! - **Session lifecycle**: connect, authenticate, list shares, attach a
//!   share, and tear everything down with an idempotent `close`.
//! - **Object handles**: every open is paired with exactly one close, even
//!   when the operation in between fails. Handles are consumed on close.
//! - **Filesystem operations**:
//!   - Read whole files in bounded chunks.
//!   - List directories (optionally with a search pattern).
//!   - Create files and directories.
//!   - Delete files, empty directories, open handles, and the direct
//!     children of a directory (with a per-entry report).
//! - **Pluggable transport**: wire encoding lives behind the [`Transport`]
//!   trait. [`MemoryTransport`] is an in-process server for tests and demos.
//! - **Configuration**: JSON settings plus `SMB_*` environment overrides.
//!
//! Paths are relative to the share root and may use `/` or `\`.
//!
//! ## Example: Basic Usage
//!
//! ```no_run
//! use smbsession::{ClientConfig, EntriesExt, MemoryTransport, Session};
//!
//! # async fn example() -> smbsession::Result<()> {
//! let config = ClientConfig::load("appsettings.json")?;
//! let endpoint = config.endpoint();
//!
//! let session = Session::login(MemoryTransport::new(), &endpoint, &config.credentials()).await?;
//! for share in session.list_shares().await? {
//!     println!("{}", share);
//! }
//!
//! let share = session.attach_share(endpoint.share()).await?;
//! share.create_file("shared\\hello.txt", b"hello").await?;
//! for entry in share.list_directory("shared").await?.without_dots() {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! let contents = share.read_file("shared\\hello.txt").await?;
//! assert_eq!(contents, b"hello");
//! share.delete_file("shared\\hello.txt").await?;
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod progress;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{Result, SmbError};
pub use fs::{
    DeletionReport, DirectoryEntry, EntriesExt, EntryDeletion, EntryKind, HandleState,
    ObjectHandle, OpenOptions,
};
pub use progress::{ProgressCallback, TransferProgress};
pub use protocol::{
    AccessMask, CreateDisposition, FileAttributes, NtStatus, ObjectKind, ShareAccess,
};
pub use session::{Credentials, Endpoint, Session, SessionState, ShareConnection};
pub use transport::{MemoryTransport, Transport};
