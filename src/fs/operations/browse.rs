//! Directory enumeration.

use tracing::debug;

use crate::error::{ObjectOp, Result};
use crate::fs::entry::{DirectoryEntry, EntriesExt};
use crate::fs::handle::{ObjectHandle, OpenOptions, display_path};
use crate::protocol::NtStatus;
use crate::session::{Connection, ShareConnection};
use crate::transport::Transport;

/// Search pattern matching every entry.
pub const MATCH_ALL: &str = "*";

impl<T: Transport> Connection<T> {
    /// One enumeration request on an open directory handle.
    ///
    /// Entries come back in server order, `.` and `..` included. A server
    /// answering "no more files" yields an empty listing.
    pub(crate) async fn enumerate(
        &mut self,
        handle: &ObjectHandle,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        self.check_handle(handle)?;
        let path = display_path(handle.path()).to_string();
        match self
            .transport
            .query_directory(handle.tree, handle.id, pattern)
            .await
        {
            Ok(raw) => {
                let entries: Vec<DirectoryEntry> =
                    raw.into_iter().map(DirectoryEntry::from).collect();
                debug!(path = %path, pattern, count = entries.len(), "enumerated");
                Ok(entries)
            }
            Err(NtStatus::NoMoreFiles) => Ok(Vec::new()),
            Err(status) => Err(self.fail(ObjectOp::Enumerate, &path, status)),
        }
    }

    /// Open a directory, enumerate it, and close it.
    pub(crate) async fn list_directory(
        &mut self,
        share: &ShareConnection<T>,
        path: &str,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let handle = self
            .open(share.tree, share.epoch, path, &OpenOptions::list_directory())
            .await?;
        let outcome = self.enumerate(&handle, pattern).await;
        self.release(handle, outcome).await
    }
}

impl<T: Transport> ShareConnection<T> {
    /// Enumerate an open directory handle with a search pattern (`*` for all).
    pub async fn enumerate(
        &self,
        handle: &ObjectHandle,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let mut conn = self.lock().await?;
        conn.enumerate(handle, pattern).await
    }

    /// List a directory.
    ///
    /// Returns every entry in server order, including `.` and `..`; use
    /// [`EntriesExt::without_dots`] to drop them.
    ///
    /// # Example
    /// ```no_run
    /// # use smbsession::{EntriesExt, MemoryTransport, ShareConnection};
    /// # async fn example(share: &ShareConnection<MemoryTransport>) -> smbsession::Result<()> {
    /// for entry in share.list_directory("administrator/shared").await?.without_dots() {
    ///     println!("{} {}", entry.name, entry.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        self.list_directory_matching(path, MATCH_ALL).await
    }

    /// List the entries of a directory whose names match `pattern`.
    pub async fn list_directory_matching(
        &self,
        path: &str,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let mut conn = self.lock().await?;
        conn.list_directory(self, path, pattern).await
    }

    /// List a directory without the `.` and `..` entries.
    pub async fn list_children(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        Ok(self.list_directory(path).await?.without_dots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmbError;
    use crate::fs::entry::EntryKind;
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
            .with_file("Users", "shared/a.txt", b"12345")
            .with_directory("Users", "shared/sub")
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_listing_keeps_dots_and_order() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let entries = share.list_directory("shared").await.unwrap();
        assert_eq!(names(&entries), vec![".", "..", "a.txt", "sub"]);
        assert_eq!(entries[2].kind, EntryKind::File);
        assert_eq!(entries[2].size, 5);
        assert_eq!(entries[3].kind, EntryKind::Directory);

        let children = entries.without_dots();
        assert_eq!(names(&children), vec!["a.txt", "sub"]);

        let stats = server.stats();
        assert_eq!(stats.enumerations, 1);
        assert_eq!(stats.opens, stats.closes);
    }

    #[tokio::test]
    async fn test_pattern() {
        let server = server().with_file("Users", "shared/b.log", b"");
        let (_session, share) = attach(&server).await;

        let entries = share.list_directory_matching("shared", "*.txt").await.unwrap();
        assert_eq!(names(&entries), vec!["a.txt"]);

        let entries = share.list_directory_matching("shared", "*.none").await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_children_of_root() {
        let server = server();
        let (_session, share) = attach(&server).await;
        let entries = share.list_children("/").await.unwrap();
        assert_eq!(names(&entries), vec!["shared"]);
    }

    #[tokio::test]
    async fn test_enumerate_open_handle() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let handle = share
            .open("shared\\sub", &OpenOptions::list_directory())
            .await
            .unwrap();
        let entries = share.enumerate(&handle, MATCH_ALL).await.unwrap();
        share.close(handle).await.unwrap();
        assert_eq!(names(&entries), vec![".", ".."]);
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let server = server();
        let (_session, share) = attach(&server).await;
        let err = share.list_directory("nope").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Open {
                status: NtStatus::ObjectNameNotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_enumeration_failure_closes_handle() {
        let server = server();
        let (_session, share) = attach(&server).await;
        server.fail_next(FaultPoint::QueryDirectory, NtStatus::AccessDenied);

        let err = share.list_directory("shared").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Enumerate {
                status: NtStatus::AccessDenied,
                ..
            }
        ));
        let stats = server.stats();
        assert_eq!(stats.opens, 1);
        assert_eq!(stats.closes, 1);
    }
}
