//! Chunked reads.

use tracing::debug;

use crate::error::{ObjectOp, Result, SmbError};
use crate::fs::handle::{ObjectHandle, OpenOptions, display_path};
use crate::progress::TransferProgress;
use crate::session::{Connection, ShareConnection};
use crate::transport::Transport;

/// Cursor and buffer for one whole-object read.
#[derive(Debug, Default)]
pub struct ReadAccumulator {
    offset: u64,
    buffer: Vec<u8>,
    finished: bool,
}

impl ReadAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the next chunk to request.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append a chunk. An empty chunk marks the end of the object.
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            self.finished = true;
            return;
        }
        self.buffer.extend_from_slice(chunk);
        self.offset += chunk.len() as u64;
    }

    /// Mark the end of the object (end-of-data status).
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl<T: Transport> Connection<T> {
    /// Read the whole object behind `handle` in chunks of at most `chunk_size`.
    pub(crate) async fn read_all(
        &mut self,
        handle: &ObjectHandle,
        chunk_size: u32,
    ) -> Result<Vec<u8>> {
        self.check_handle(handle)?;
        let max = self.transport.max_read_size();
        if chunk_size == 0 || chunk_size > max {
            return Err(SmbError::InvalidArgument(format!(
                "chunk size {} outside 1..={}",
                chunk_size, max
            )));
        }

        let path = display_path(handle.path()).to_string();
        let mut acc = ReadAccumulator::new();
        while !acc.is_finished() {
            let offset = acc.offset();
            match self
                .transport
                .read(handle.tree, handle.id, offset, chunk_size)
                .await
            {
                Ok(chunk) => {
                    acc.push(&chunk);
                    if !chunk.is_empty() {
                        self.report_progress(&TransferProgress::new(acc.offset(), None, &path));
                    }
                }
                Err(status) if status.is_end_of_data() => acc.finish(),
                Err(status) => return Err(self.fail(ObjectOp::Read, &path, status)),
            }
        }

        debug!(path = %path, bytes = acc.offset(), "read complete");
        Ok(acc.into_bytes())
    }
}

impl<T: Transport> ShareConnection<T> {
    /// Read the whole object behind an open handle.
    ///
    /// Does not close the handle. Fails with `InvalidArgument` if
    /// `chunk_size` is zero or larger than the server's maximum read size.
    pub async fn read_all(&self, handle: &ObjectHandle, chunk_size: u32) -> Result<Vec<u8>> {
        let mut conn = self.lock().await?;
        conn.read_all(handle, chunk_size).await
    }

    /// Open a file, read all of it, and close it.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut conn = self.lock().await?;
        let chunk_size = conn.default_read_chunk();
        read_file_with(&mut conn, self, path, chunk_size).await
    }

    /// Same as [`ShareConnection::read_file`] with an explicit chunk size.
    pub async fn read_file_chunked(&self, path: &str, chunk_size: u32) -> Result<Vec<u8>> {
        let mut conn = self.lock().await?;
        read_file_with(&mut conn, self, path, chunk_size).await
    }
}

async fn read_file_with<T: Transport>(
    conn: &mut Connection<T>,
    share: &ShareConnection<T>,
    path: &str,
    chunk_size: u32,
) -> Result<Vec<u8>> {
    let handle = conn
        .open(share.tree, share.epoch, path, &OpenOptions::read_file())
        .await?;
    let outcome = conn.read_all(&handle, chunk_size).await;
    conn.release(handle, outcome).await
}
