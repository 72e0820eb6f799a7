//! Transport client abstraction.
//!
//! A [`Transport`] performs single protocol round trips: it owns message
//! encoding, framing and authentication crypto. The session layer above it
//! only sequences requests and interprets the returned [`NtStatus`].

pub mod memory;

use std::future::Future;
use std::net::SocketAddr;

use crate::protocol::{CreateRequest, FileAttributes, NtStatus};

pub use memory::{FaultPoint, MemoryTransport, TransportStats};

/// Result of a single transport round trip.
pub type StatusResult<T> = std::result::Result<T, NtStatus>;

/// Server-assigned identifier of an attached share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(pub u32);

/// Server-assigned identifier of an open object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u64);

/// One entry of a directory listing as the server returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub file_name: String,
    pub attributes: FileAttributes,
    /// Logical size in bytes (0 for directories)
    pub end_of_file: u64,
}

/// Round-trip capability consumed by [`crate::Session`].
///
/// Every method answers with either its payload or the server's status.
/// Success is implied by `Ok`; an `Err` never carries [`NtStatus::Success`].
pub trait Transport: Send {
    /// Largest read the server accepts in one request.
    fn max_read_size(&self) -> u32;

    /// Largest write the server accepts in one request.
    fn max_write_size(&self) -> u32;

    fn connect(&mut self, addr: SocketAddr) -> impl Future<Output = StatusResult<()>> + Send;

    fn login(
        &mut self,
        domain: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = StatusResult<()>> + Send;

    fn list_shares(&mut self) -> impl Future<Output = StatusResult<Vec<String>>> + Send;

    fn tree_connect(&mut self, share: &str) -> impl Future<Output = StatusResult<TreeId>> + Send;

    fn create(
        &mut self,
        tree: TreeId,
        request: &CreateRequest,
    ) -> impl Future<Output = StatusResult<FileId>> + Send;

    fn read(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        length: u32,
    ) -> impl Future<Output = StatusResult<Vec<u8>>> + Send;

    /// Returns the number of bytes the server stored.
    fn write(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        data: &[u8],
    ) -> impl Future<Output = StatusResult<u32>> + Send;

    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        pattern: &str,
    ) -> impl Future<Output = StatusResult<Vec<RawEntry>>> + Send;

    fn set_delete_pending(
        &mut self,
        tree: TreeId,
        file: FileId,
        delete_pending: bool,
    ) -> impl Future<Output = StatusResult<()>> + Send;

    fn close(&mut self, tree: TreeId, file: FileId)
    -> impl Future<Output = StatusResult<()>> + Send;

    fn tree_disconnect(&mut self, tree: TreeId) -> impl Future<Output = StatusResult<()>> + Send;

    fn logoff(&mut self) -> impl Future<Output = StatusResult<()>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}
