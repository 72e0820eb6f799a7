//! File and directory creation.

use tracing::{debug, info};

use crate::error::{ObjectOp, Result, SmbError};
use crate::fs::handle::{ObjectHandle, OpenOptions, display_path};
use crate::progress::TransferProgress;
use crate::session::{Connection, ShareConnection};
use crate::transport::Transport;

impl<T: Transport> Connection<T> {
    /// Write `data` from offset 0 in chunks bounded by the server's maximum
    /// write size. Returns the number of bytes written.
    pub(crate) async fn write_all(&mut self, handle: &ObjectHandle, data: &[u8]) -> Result<u64> {
        self.check_handle(handle)?;
        let path = display_path(handle.path()).to_string();
        let max = self.transport.max_write_size().max(1) as usize;
        let total = data.len() as u64;

        let mut offset = 0u64;
        for chunk in data.chunks(max) {
            let mut pending = chunk;
            while !pending.is_empty() {
                let written = match self
                    .transport
                    .write(handle.tree, handle.id, offset, pending)
                    .await
                {
                    Ok(written) => written as usize,
                    Err(status) => return Err(self.fail(ObjectOp::Write, &path, status)),
                };
                if written == 0 {
                    return Err(SmbError::ShortWrite { path, offset });
                }
                let written = written.min(pending.len());
                pending = &pending[written..];
                offset += written as u64;
                self.report_progress(&TransferProgress::new(offset, Some(total), &path));
            }
        }

        debug!(path = %path, bytes = offset, "write complete");
        Ok(offset)
    }
}

impl<T: Transport> ShareConnection<T> {
    /// Write `data` through an open handle, starting at offset 0.
    ///
    /// Does not close the handle.
    pub async fn write_all(&self, handle: &ObjectHandle, data: &[u8]) -> Result<u64> {
        let mut conn = self.lock().await?;
        conn.write_all(handle, data).await
    }

    /// Create (or truncate) a file, write `content`, and close it.
    pub async fn create_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let mut conn = self.lock().await?;
        let handle = conn
            .open(self.tree, self.epoch, path, &OpenOptions::write_file())
            .await?;
        let outcome = conn.write_all(&handle, content).await;
        conn.release(handle, outcome).await?;
        info!(path = %path, bytes = content.len(), "file created");
        Ok(())
    }

    /// Create a new directory. Fails with a name collision if it exists.
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        let mut conn = self.lock().await?;
        let handle = conn
            .open(self.tree, self.epoch, path, &OpenOptions::create_directory())
            .await?;
        conn.close_handle(handle).await?;
        info!(path = %path, "directory created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NtStatus, ShareAccess};
    use crate::session::{Credentials, Endpoint, Session};
    use crate::transport::{FaultPoint, MemoryTransport};

    async fn attach(
        server: &MemoryTransport,
    ) -> (Session<MemoryTransport>, ShareConnection<MemoryTransport>) {
        let session = Session::login(
            server.clone(),
            &Endpoint::new("127.0.0.1", "Users"),
            &Credentials::new("alice", "secret"),
        )
        .await
        .unwrap();
        let share = session.attach_share("Users").await.unwrap();
        (session, share)
    }

    fn server() -> MemoryTransport {
        MemoryTransport::new()
            .with_account("alice", "secret")
            .with_share("Users")
            .with_directory("Users", "shared")
    }

    #[tokio::test]
    async fn test_create_file_in_chunks() {
        let server = server().with_max_write_size(4);
        let (_session, share) = attach(&server).await;

        share.create_file("shared/new.txt", b"0123456789").await.unwrap();
        assert_eq!(
            server.file_contents("Users", "shared/new.txt").unwrap(),
            b"0123456789"
        );
        let stats = server.stats();
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.opens, stats.closes);
    }

    #[tokio::test]
    async fn test_create_file_overwrites() {
        let server = server().with_file("Users", "shared/f.txt", b"old contents");
        let (_session, share) = attach(&server).await;
        share.create_file("shared/f.txt", b"new").await.unwrap();
        assert_eq!(server.file_contents("Users", "shared/f.txt").unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_create_empty_file() {
        let server = server();
        let (_session, share) = attach(&server).await;
        share.create_file("shared/empty", b"").await.unwrap();
        assert_eq!(server.file_contents("Users", "shared/empty").unwrap(), b"");
        assert_eq!(server.stats().writes, 0);
    }

    #[tokio::test]
    async fn test_write_failure_closes_handle() {
        let server = server();
        let (_session, share) = attach(&server).await;
        server.fail_next(FaultPoint::Write, NtStatus::AccessDenied);

        let err = share.create_file("shared/x", b"data").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Write {
                status: NtStatus::AccessDenied,
                ..
            }
        ));
        assert_eq!(server.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_write_through_open_handle() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let handle = share.open("shared/h.txt", &OpenOptions::write_file()).await.unwrap();
        assert_eq!(share.write_all(&handle, b"abc").await.unwrap(), 3);
        share.close(handle).await.unwrap();
        assert_eq!(server.file_contents("Users", "shared/h.txt").unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_create_file_in_locked_file() {
        let server = server().with_file("Users", "shared/busy", b"");
        server.lock("Users", "shared/busy", ShareAccess::READ);
        let (_session, share) = attach(&server).await;

        let err = share.create_file("shared/busy", b"x").await.unwrap_err();
        assert_eq!(err.status(), Some(NtStatus::SharingViolation));
    }

    #[tokio::test]
    async fn test_create_directory() {
        let server = server();
        let (_session, share) = attach(&server).await;

        share.create_directory("shared/dir").await.unwrap();
        assert!(server.exists("Users", "shared/dir"));

        let err = share.create_directory("shared/dir").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Open {
                status: NtStatus::ObjectNameCollision,
                ..
            }
        ));

        let err = share.create_directory("missing/dir").await.unwrap_err();
        assert_eq!(err.status(), Some(NtStatus::ObjectPathNotFound));
    }
}
