//! Deletion through the delete-pending disposition.
//!
//! An object is deleted by opening it with delete access, marking it
//! delete-pending, and closing the handle; the server removes it on the
//! last close.

use tracing::{debug, info, warn};

use crate::error::{ObjectOp, Result};
use crate::fs::entry::{DirectoryEntry, EntryKind};
use crate::fs::handle::{HandleState, ObjectHandle, OpenOptions, display_path};
use crate::fs::path::join_path;
use crate::session::{Connection, ShareConnection};
use crate::transport::{Transport, TreeId};

use super::browse::MATCH_ALL;

/// Outcome of deleting one entry during a directory sweep.
#[derive(Debug)]
pub struct EntryDeletion {
    pub entry: DirectoryEntry,
    /// Share-relative path of the entry
    pub path: String,
    pub result: Result<()>,
}

/// Per-entry results of [`ShareConnection::delete_directory_tree`].
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Files and directories a deletion was attempted for, in listing order
    pub entries: Vec<EntryDeletion>,
    /// Entries that are neither files nor directories, left in place
    pub skipped: Vec<DirectoryEntry>,
}

impl DeletionReport {
    /// Entries that were deleted.
    pub fn deleted(&self) -> impl Iterator<Item = &EntryDeletion> {
        self.entries.iter().filter(|e| e.result.is_ok())
    }

    /// Entries whose deletion failed.
    pub fn failed(&self) -> impl Iterator<Item = &EntryDeletion> {
        self.entries.iter().filter(|e| e.result.is_err())
    }

    /// Check if every attempted deletion succeeded.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.result.is_ok())
    }
}

impl<T: Transport> Connection<T> {
    /// Mark an open handle delete-pending.
    pub(crate) async fn mark_delete_pending(&mut self, handle: &mut ObjectHandle) -> Result<()> {
        self.check_handle(handle)?;
        match self
            .transport
            .set_delete_pending(handle.tree, handle.id, true)
            .await
        {
            Ok(()) => {
                handle.set_state(HandleState::DeletePending);
                Ok(())
            }
            Err(status) => Err(self.fail(ObjectOp::Delete, display_path(handle.path()), status)),
        }
    }

    /// Mark delete-pending and close; the close commits the deletion.
    pub(crate) async fn delete_open(&mut self, mut handle: ObjectHandle) -> Result<()> {
        let outcome = self.mark_delete_pending(&mut handle).await;
        let path = handle.path().to_string();
        self.release(handle, outcome).await?;
        debug!(path = %display_path(&path), "deleted");
        Ok(())
    }

    /// Open `path` with delete intent and delete it.
    pub(crate) async fn delete_path(
        &mut self,
        tree: TreeId,
        epoch: u64,
        path: &str,
        options: &OpenOptions,
    ) -> Result<()> {
        let handle = self.open(tree, epoch, path, options).await?;
        self.delete_open(handle).await
    }
}

impl<T: Transport> ShareConnection<T> {
    /// Delete a file.
    ///
    /// The file must not be open elsewhere in a way that forbids exclusive
    /// delete access; otherwise the open fails with a sharing violation.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let mut conn = self.lock().await?;
        conn.delete_path(self.tree, self.epoch, path, &OpenOptions::delete_file())
            .await?;
        info!(path = %path, "file deleted");
        Ok(())
    }

    /// Delete an empty directory.
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let mut conn = self.lock().await?;
        conn.delete_path(self.tree, self.epoch, path, &OpenOptions::delete_directory())
            .await?;
        info!(path = %path, "directory deleted");
        Ok(())
    }

    /// Delete the object behind an already-open handle, consuming it.
    ///
    /// The handle must have been opened with delete access.
    pub async fn delete_open(&self, handle: ObjectHandle) -> Result<()> {
        let mut conn = self.lock_for_release().await;
        conn.delete_open(handle).await
    }

    /// Delete the direct children of a directory.
    ///
    /// Files and directories are deleted one by one; a failure on one entry
    /// (for example a non-empty subdirectory) is recorded in the report and
    /// the sweep moves on. The sweep does not recurse and the directory
    /// itself is left in place. Only failures that make the share unusable
    /// (transport loss, session closed) abort it.
    pub async fn delete_directory_tree(&self, path: &str) -> Result<DeletionReport> {
        let mut conn = self.lock().await?;
        let entries = conn.list_directory(self, path, MATCH_ALL).await?;

        let mut report = DeletionReport::default();
        for entry in entries {
            if entry.is_dot() {
                continue;
            }
            let options = match entry.kind {
                EntryKind::File => OpenOptions::delete_file(),
                EntryKind::Directory => OpenOptions::delete_directory(),
                EntryKind::Other => {
                    debug!(name = %entry.name, "skipping entry that is neither file nor directory");
                    report.skipped.push(entry);
                    continue;
                }
            };

            let entry_path = join_path(path, &entry.name);
            let result = match conn
                .delete_path(self.tree, self.epoch, &entry_path, &options)
                .await
            {
                Err(err) if err.is_transport() || err.is_session_closed() => return Err(err),
                Err(err) => {
                    warn!(path = %entry_path, error = %err, "entry not deleted");
                    Err(err)
                }
                Ok(()) => Ok(()),
            };
            report.entries.push(EntryDeletion {
                entry,
                path: entry_path,
                result,
            });
        }

        info!(
            path = %path,
            deleted = report.deleted().count(),
            failed = report.failed().count(),
            skipped = report.skipped.len(),
            "directory sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmbError;
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
            .with_file("Users", "shared/a.txt", b"abc")
    }

    #[tokio::test]
    async fn test_delete_file_then_open_fails() {
        let server = server();
        let (_session, share) = attach(&server).await;

        share.delete_file("shared/a.txt").await.unwrap();
        assert!(!server.exists("Users", "shared/a.txt"));

        let err = share
            .open("shared/a.txt", &OpenOptions::read_file())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SmbError::Open {
                status: NtStatus::ObjectNameNotFound,
                ..
            }
        ));
        let stats = server.stats();
        assert_eq!(stats.opens, stats.closes);
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_open_failure() {
        let server = server();
        let (_session, share) = attach(&server).await;
        let err = share.delete_file("shared/none.txt").await.unwrap_err();
        assert!(matches!(err, SmbError::Open { .. }));
    }

    #[tokio::test]
    async fn test_delete_locked_file() {
        let server = server();
        server.lock("Users", "shared/a.txt", ShareAccess::READ);
        let (_session, share) = attach(&server).await;

        let err = share.delete_file("shared/a.txt").await.unwrap_err();
        assert_eq!(err.status(), Some(NtStatus::SharingViolation));
        assert!(server.exists("Users", "shared/a.txt"));
    }

    #[tokio::test]
    async fn test_disposition_failure_keeps_file_and_closes() {
        let server = server();
        let (_session, share) = attach(&server).await;
        server.fail_next(FaultPoint::SetDeletePending, NtStatus::AccessDenied);

        let err = share.delete_file("shared/a.txt").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Delete {
                status: NtStatus::AccessDenied,
                ..
            }
        ));
        assert!(server.exists("Users", "shared/a.txt"));
        assert_eq!(server.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_delete_open_handle() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let handle = share.open("shared/b.txt", &OpenOptions::write_file()).await.unwrap();
        share.write_all(&handle, b"temp").await.unwrap();
        share.delete_open(handle).await.unwrap();
        assert!(!server.exists("Users", "shared/b.txt"));
    }

    #[tokio::test]
    async fn test_delete_open_without_delete_access() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let handle = share.open("shared/a.txt", &OpenOptions::read_file()).await.unwrap();
        let err = share.delete_open(handle).await.unwrap_err();
        assert_eq!(err.status(), Some(NtStatus::AccessDenied));
        assert!(server.exists("Users", "shared/a.txt"));
        assert_eq!(server.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_delete_directory() {
        let server = server().with_directory("Users", "shared/empty");
        let (_session, share) = attach(&server).await;

        share.delete_directory("shared/empty").await.unwrap();
        assert!(!server.exists("Users", "shared/empty"));

        let err = share.delete_directory("shared").await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Delete {
                status: NtStatus::DirectoryNotEmpty,
                ..
            }
        ));
        assert!(server.exists("Users", "shared"));
    }

    #[tokio::test]
    async fn test_sweep_reports_per_entry() {
        let server = server()
            .with_directory("Users", "shared/empty")
            .with_file("Users", "shared/full/inner.txt", b"x");
        let (_session, share) = attach(&server).await;

        let report = share.delete_directory_tree("shared").await.unwrap();
        let outcomes: Vec<(&str, Option<NtStatus>)> = report
            .entries
            .iter()
            .map(|e| {
                (
                    e.entry.name.as_str(),
                    e.result.as_ref().err().and_then(SmbError::status),
                )
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("a.txt", None),
                ("empty", None),
                ("full", Some(NtStatus::DirectoryNotEmpty)),
            ]
        );
        assert!(!report.is_complete());
        assert_eq!(report.deleted().count(), 2);
        assert_eq!(report.failed().count(), 1);

        assert!(server.exists("Users", "shared"));
        assert!(server.exists("Users", "shared/full/inner.txt"));
        assert!(!server.exists("Users", "shared/empty"));
        assert_eq!(server.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_other_entries() {
        let server = server();
        server.add_device("Users", "shared/printer");
        let (_session, share) = attach(&server).await;

        let report = share.delete_directory_tree("shared").await.unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "printer");
        assert!(server.exists("Users", "shared/printer"));
    }

    #[tokio::test]
    async fn test_sweep_of_empty_directory() {
        let server = server().with_directory("Users", "nothing");
        let (_session, share) = attach(&server).await;
        let report = share.delete_directory_tree("nothing").await.unwrap();
        assert!(report.entries.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_sweep_aborts_on_transport_loss() {
        let server = server().with_file("Users", "shared/b.txt", b"");
        let (session, share) = attach(&server).await;
        server.fail_next(FaultPoint::Create, NtStatus::ConnectionDisconnected);

        // The first create is the directory open itself.
        let err = share.delete_directory_tree("shared").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(session.state().await, crate::SessionState::Disconnected);
    }
}
