//! Object handles and the open/close discipline around them.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{ObjectOp, Result, SmbError};
use crate::protocol::{
    AccessMask, CreateDisposition, CreateRequest, FileAttributes, ObjectKind, ShareAccess,
};
use crate::session::{Connection, ShareConnection};
use crate::transport::{FileId, Transport, TreeId};

use super::path::normalize_path;

/// Parameters for opening a remote object.
///
/// Start from one of the presets ([`OpenOptions::read_file`],
/// [`OpenOptions::list_directory`], ...) or from [`OpenOptions::new`] and
/// adjust with the builder methods. Invalid combinations are rejected when
/// the open is attempted, before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    access: AccessMask,
    attributes: FileAttributes,
    share_access: ShareAccess,
    disposition: CreateDisposition,
    kind: ObjectKind,
}

impl OpenOptions {
    /// Open an existing object of `kind` with no access rights set.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            access: AccessMask::empty(),
            attributes: FileAttributes::empty(),
            share_access: ShareAccess::empty(),
            disposition: CreateDisposition::OpenExisting,
            kind,
        }
    }

    pub fn access(mut self, access: AccessMask) -> Self {
        self.access = access;
        self
    }

    pub fn attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn share_access(mut self, share_access: ShareAccess) -> Self {
        self.share_access = share_access;
        self
    }

    pub fn disposition(mut self, disposition: CreateDisposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Read an existing file, letting others read it too.
    pub fn read_file() -> Self {
        Self::new(ObjectKind::File)
            .access(AccessMask::GENERIC_READ | AccessMask::SYNCHRONIZE)
            .attributes(FileAttributes::NORMAL)
            .share_access(ShareAccess::READ)
    }

    /// Open an existing directory for enumeration.
    pub fn list_directory() -> Self {
        Self::new(ObjectKind::Directory)
            .access(AccessMask::GENERIC_READ)
            .attributes(FileAttributes::DIRECTORY)
            .share_access(ShareAccess::READ | ShareAccess::WRITE)
    }

    /// Create or truncate a file for exclusive writing.
    ///
    /// Delete access is requested as well so the handle can be passed to
    /// [`ShareConnection::delete_open`].
    pub fn write_file() -> Self {
        Self::new(ObjectKind::File)
            .access(AccessMask::GENERIC_WRITE | AccessMask::DELETE | AccessMask::SYNCHRONIZE)
            .attributes(FileAttributes::NORMAL)
            .disposition(CreateDisposition::OverwriteOrCreate)
    }

    /// Create a new directory; fails if it already exists.
    pub fn create_directory() -> Self {
        Self::new(ObjectKind::Directory)
            .access(AccessMask::FILE_ADD_SUBDIRECTORY)
            .share_access(ShareAccess::READ | ShareAccess::WRITE)
            .disposition(CreateDisposition::CreateNew)
    }

    /// Open an existing file exclusively with delete intent.
    pub fn delete_file() -> Self {
        Self::new(ObjectKind::File)
            .access(AccessMask::GENERIC_WRITE | AccessMask::DELETE | AccessMask::SYNCHRONIZE)
            .attributes(FileAttributes::NORMAL)
    }

    /// Open an existing directory exclusively with delete intent.
    pub fn delete_directory() -> Self {
        Self::new(ObjectKind::Directory)
            .access(AccessMask::GENERIC_WRITE | AccessMask::DELETE | AccessMask::SYNCHRONIZE)
            .attributes(FileAttributes::NORMAL)
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn get_disposition(&self) -> CreateDisposition {
        self.disposition
    }

    /// Validate and turn into a create request for `path`.
    pub(crate) fn to_request(&self, path: &str) -> Result<CreateRequest> {
        let path = normalize_path(path);
        if self.access.is_empty() {
            return Err(SmbError::InvalidArgument(format!(
                "no access requested for {}",
                display_path(&path)
            )));
        }
        if self.kind == ObjectKind::Directory
            && self.disposition == CreateDisposition::OverwriteOrCreate
        {
            return Err(SmbError::InvalidArgument(format!(
                "cannot overwrite directory {}",
                display_path(&path)
            )));
        }
        if self.kind == ObjectKind::File && path.is_empty() {
            return Err(SmbError::InvalidArgument(
                "the share root is not a file".to_string(),
            ));
        }
        Ok(CreateRequest {
            path,
            access: self.access,
            attributes: self.attributes,
            share_access: self.share_access,
            disposition: self.disposition,
            kind: self.kind,
            options: self.kind.create_options(),
        })
    }
}

/// Path as shown in messages; the share root is `\`.
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() { "\\" } else { path }
}

/// Where an open handle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Open,
    /// Marked for deletion; the object goes away when the handle closes.
    DeletePending,
}

/// One open remote object.
///
/// Obtained from [`ShareConnection::open`] and released with
/// [`ShareConnection::close`], which consumes it. Dropping a handle without
/// closing it leaves the server-side handle open until the share is
/// detached, and is logged as a warning.
#[must_use = "object handles must be closed with ShareConnection::close"]
pub struct ObjectHandle {
    pub(crate) id: FileId,
    pub(crate) tree: TreeId,
    pub(crate) epoch: u64,
    path: String,
    kind: ObjectKind,
    access: AccessMask,
    share_access: ShareAccess,
    disposition: CreateDisposition,
    state: HandleState,
    released: bool,
}

impl ObjectHandle {
    fn new(id: FileId, tree: TreeId, epoch: u64, request: CreateRequest) -> Self {
        Self {
            id,
            tree,
            epoch,
            path: request.path,
            kind: request.kind,
            access: request.access,
            share_access: request.share_access,
            disposition: request.disposition,
            state: HandleState::Open,
            released: false,
        }
    }

    /// Share-relative path in wire form.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn access(&self) -> AccessMask {
        self.access
    }

    pub fn share_access(&self) -> ShareAccess {
        self.share_access
    }

    pub fn disposition(&self) -> CreateDisposition {
        self.disposition
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: HandleState) {
        self.state = state;
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        if !self.released {
            warn!(path = %display_path(&self.path), "object handle dropped without close");
        }
    }
}

impl<T: Transport> Connection<T> {
    /// Open `path` on `tree`.
    pub(crate) async fn open(
        &mut self,
        tree: TreeId,
        epoch: u64,
        path: &str,
        options: &OpenOptions,
    ) -> Result<ObjectHandle> {
        let request = options.to_request(path)?;
        match self.transport.create(tree, &request).await {
            Ok(id) => {
                debug!(
                    path = %display_path(&request.path),
                    kind = ?request.kind,
                    disposition = ?request.disposition,
                    "opened"
                );
                Ok(ObjectHandle::new(id, tree, epoch, request))
            }
            Err(status) => Err(self.fail(ObjectOp::Open, display_path(&request.path), status)),
        }
    }

    /// Check that `handle` still belongs to the attached share.
    pub(crate) fn check_handle(&self, handle: &ObjectHandle) -> Result<()> {
        self.require_live(handle.epoch)
    }

    /// Close `handle`. The handle counts as released whatever the outcome.
    ///
    /// If the share is already gone the server has dropped the handle with
    /// it, so nothing is sent and `SessionClosed` is returned.
    pub(crate) async fn close_handle(&mut self, mut handle: ObjectHandle) -> Result<()> {
        handle.released = true;
        self.check_handle(&handle)?;
        match self.transport.close(handle.tree, handle.id).await {
            Ok(()) => {
                debug!(path = %display_path(&handle.path), "closed");
                Ok(())
            }
            Err(status) => Err(self.fail(ObjectOp::Close, display_path(&handle.path), status)),
        }
    }

    /// Close `handle` after an operation on it, keeping the operation's
    /// error if both fail.
    pub(crate) async fn release<R>(
        &mut self,
        handle: ObjectHandle,
        outcome: Result<R>,
    ) -> Result<R> {
        let path = display_path(&handle.path).to_string();
        let closed = self.close_handle(handle).await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            // Nothing left to close once the share is gone.
            (Err(err), Err(SmbError::SessionClosed)) => Err(err),
            (Err(err), Err(close_err)) => {
                self.cleanup_failures += 1;
                warn!(
                    path = %path,
                    error = %err,
                    close_error = %close_err,
                    "close failed while handling an earlier error"
                );
                Err(err)
            }
        }
    }
}

impl<T: Transport> ShareConnection<T> {
    /// Open a file or directory.
    ///
    /// The returned handle must be passed back to [`ShareConnection::close`]
    /// (or [`ShareConnection::delete_open`]).
    ///
    /// # Arguments
    /// * `path` - Share-relative path; `""` is the share root
    /// * `options` - Access, sharing, disposition and kind
    pub async fn open(&self, path: &str, options: &OpenOptions) -> Result<ObjectHandle> {
        let mut conn = self.lock().await?;
        conn.open(self.tree, self.epoch, path, options).await
    }

    /// Close a handle. Consumes it, so it cannot be used or closed again.
    pub async fn close(&self, handle: ObjectHandle) -> Result<()> {
        let mut conn = self.lock_for_release().await;
        conn.close_handle(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CreateOptions, NtStatus};
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
            .with_file("Users", "docs/a.txt", b"hello")
    }

    #[test]
    fn test_presets_build_requests() {
        let request = OpenOptions::read_file().to_request("docs/a.txt").unwrap();
        assert_eq!(request.path, "docs\\a.txt");
        assert_eq!(request.disposition, CreateDisposition::OpenExisting);
        assert!(request.options.contains(CreateOptions::NON_DIRECTORY_FILE));

        let request = OpenOptions::list_directory().to_request("/").unwrap();
        assert_eq!(request.path, "");
        assert_eq!(request.options, CreateOptions::DIRECTORY_FILE);

        let request = OpenOptions::write_file().to_request("x").unwrap();
        assert_eq!(request.disposition, CreateDisposition::OverwriteOrCreate);
        assert!(request.share_access.is_empty());
        assert!(request.access.grants_delete());
    }

    #[test]
    fn test_invalid_combinations_rejected() {
        let overwrite_dir =
            OpenOptions::list_directory().disposition(CreateDisposition::OverwriteOrCreate);
        assert!(matches!(
            overwrite_dir.to_request("d"),
            Err(SmbError::InvalidArgument(_))
        ));

        let no_access = OpenOptions::new(ObjectKind::File);
        assert!(matches!(
            no_access.to_request("f"),
            Err(SmbError::InvalidArgument(_))
        ));

        assert!(matches!(
            OpenOptions::read_file().to_request(""),
            Err(SmbError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_options_never_reach_transport() {
        let server = server();
        let (_session, share) = attach(&server).await;
        let options =
            OpenOptions::list_directory().disposition(CreateDisposition::OverwriteOrCreate);
        assert!(share.open("docs", &options).await.is_err());
        assert_eq!(server.stats().opens, 0);
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let handle = share.open("docs/a.txt", &OpenOptions::read_file()).await.unwrap();
        assert_eq!(handle.path(), "docs\\a.txt");
        assert_eq!(handle.state(), HandleState::Open);
        assert_eq!(server.open_handles(), 1);

        share.close(handle).await.unwrap();
        assert_eq!(server.open_handles(), 0);
        assert_eq!(server.stats().closes, 1);
    }

    #[tokio::test]
    async fn test_open_failures_are_typed() {
        let server = server();
        let (_session, share) = attach(&server).await;

        let err = share.open("missing.txt", &OpenOptions::read_file()).await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Open {
                status: NtStatus::ObjectNameNotFound,
                ..
            }
        ));

        let err = share.open("docs", &OpenOptions::read_file()).await.unwrap_err();
        assert_eq!(err.status(), Some(NtStatus::FileIsADirectory));

        server.lock("Users", "docs/a.txt", ShareAccess::empty());
        let err = share.open("docs/a.txt", &OpenOptions::read_file()).await.unwrap_err();
        assert!(matches!(
            err,
            SmbError::Open {
                status: NtStatus::SharingViolation,
                ..
            }
        ));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_close_failure_still_releases() {
        let server = server();
        let (session, share) = attach(&server).await;

        let handle = share.open("docs/a.txt", &OpenOptions::read_file()).await.unwrap();
        server.fail_next(FaultPoint::Close, NtStatus::InvalidHandle);
        let err = share.close(handle).await.unwrap_err();
        assert!(matches!(err, SmbError::Close { .. }));
        assert_eq!(server.open_handles(), 0);
        assert_eq!(session.cleanup_failures().await, 0);
    }

    #[tokio::test]
    async fn test_close_after_session_close() {
        let server = server();
        let (session, share) = attach(&server).await;
        let handle = share.open("docs/a.txt", &OpenOptions::read_file()).await.unwrap();
        session.close().await;

        let closes = server.stats().closes;
        assert!(matches!(
            share.close(handle).await,
            Err(SmbError::SessionClosed)
        ));
        assert_eq!(server.stats().closes, closes);
    }
}
