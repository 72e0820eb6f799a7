//! Session management and authentication.
//!
//! This module handles connecting, login, share attachment, and logoff.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::endpoint::{Credentials, Endpoint};
use super::share::ShareConnection;
use super::state::SessionState;
use crate::error::{ObjectOp, Result, SmbError};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::protocol::NtStatus;
use crate::transport::{Transport, TreeId};

/// The share currently attached to a session.
#[derive(Debug, Clone)]
pub(crate) struct AttachedShare {
    pub(crate) tree: TreeId,
    pub(crate) name: String,
}

/// Transport plus the session state that guards it.
///
/// Shared between a [`Session`] and the [`ShareConnection`] it hands out.
pub(crate) struct Connection<T> {
    pub(crate) transport: T,
    pub(crate) state: SessionState,
    pub(crate) endpoint: Option<Endpoint>,
    pub(crate) share: Option<AttachedShare>,
    /// The transport link was opened and not yet torn down. Survives a
    /// transport failure so `close` still disconnects.
    link_open: bool,
    /// Login succeeded and no logoff was sent since.
    logged_on: bool,
    /// Bumped whenever the attached share or the session goes away; handles
    /// and share connections from an older epoch are dead.
    pub(crate) epoch: u64,
    /// Close failures swallowed while another error was being returned
    pub(crate) cleanup_failures: u64,
    /// Chunk size for whole-object reads (defaults to the server maximum)
    pub(crate) read_chunk_size: Option<u32>,
    progress_callback: Option<ProgressCallback>,
}

impl<T: Transport> Connection<T> {
    fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::Disconnected,
            endpoint: None,
            share: None,
            link_open: false,
            logged_on: false,
            epoch: 0,
            cleanup_failures: 0,
            read_chunk_size: None,
            progress_callback: None,
        }
    }

    /// Fail fast unless the session is in `expected`.
    pub(crate) fn require(&self, operation: &'static str, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SmbError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Check that a share connection or handle from `epoch` is still live.
    pub(crate) fn require_live(&self, epoch: u64) -> Result<()> {
        if self.state == SessionState::Authenticated && self.epoch == epoch && self.share.is_some()
        {
            Ok(())
        } else {
            Err(SmbError::SessionClosed)
        }
    }

    /// Tear down local state after the transport reported a dead link.
    pub(crate) fn mark_disconnected(&mut self) {
        if self.state != SessionState::Disconnected {
            warn!(state = %self.state, "transport failed; session is now disconnected");
        }
        self.state = SessionState::Disconnected;
        self.share = None;
        self.epoch += 1;
    }

    /// Map a per-object status to a typed error, tearing the session down on
    /// transport failures.
    pub(crate) fn fail(&mut self, op: ObjectOp, path: &str, status: NtStatus) -> SmbError {
        let err = SmbError::from_status(op, path, status);
        if err.is_transport() {
            self.mark_disconnected();
        }
        err
    }

    /// Same as [`Connection::fail`] for session-level requests.
    fn fail_protocol(&mut self, operation: &'static str, status: NtStatus) -> SmbError {
        if status.is_transport() {
            self.mark_disconnected();
            return SmbError::Transport(format!("{}: {}", operation, status));
        }
        SmbError::Protocol { operation, status }
    }

    pub(crate) fn report_progress(&mut self, progress: &TransferProgress) {
        if let Some(callback) = self.progress_callback.as_mut() {
            callback(progress);
        }
    }

    /// Chunk size for a whole-object read.
    pub(crate) fn default_read_chunk(&self) -> u32 {
        let max = self.transport.max_read_size();
        self.read_chunk_size.map_or(max, |size| size.min(max))
    }

    /// Log off and drop the transport link if either is still up, whatever
    /// the session state says. Failures are logged.
    async fn teardown_link(&mut self) {
        if self.logged_on {
            self.logged_on = false;
            if let Err(status) = self.transport.logoff().await {
                warn!(%status, "logoff failed");
            }
        }
        if self.link_open {
            self.link_open = false;
            self.transport.disconnect().await;
            info!("disconnected");
        }
    }

    async fn detach_share(&mut self) {
        if let Some(share) = self.share.take() {
            self.epoch += 1;
            match self.transport.tree_disconnect(share.tree).await {
                Ok(()) => debug!(share = %share.name, "share detached"),
                Err(status) => {
                    warn!(share = %share.name, %status, "tree disconnect failed");
                }
            }
        }
    }
}

/// Client session against one file server.
///
/// Drives `connect → authenticate → attach share → close`. Operations on
/// files and directories go through the [`ShareConnection`] returned by
/// [`Session::attach_share`].
pub struct Session<T: Transport> {
    conn: Arc<Mutex<Connection<T>>>,
}

impl<T: Transport> Session<T> {
    /// Create a disconnected session over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Connection::new(transport))),
        }
    }

    /// Connect and authenticate in one step.
    ///
    /// # Example
    /// ```no_run
    /// # use smbsession::{Credentials, Endpoint, MemoryTransport, Session};
    /// # async fn example() -> smbsession::Result<()> {
    /// let endpoint = Endpoint::new("10.0.10.2", "Users");
    /// let credentials = Credentials::new("administrator", "password");
    /// let session = Session::login(MemoryTransport::new(), &endpoint, &credentials).await?;
    /// let share = session.attach_share(endpoint.share()).await?;
    /// for entry in share.list_directory("").await? {
    ///     println!("{}", entry.name);
    /// }
    /// session.close().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(
        transport: T,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self> {
        let session = Self::new(transport);
        session.connect(endpoint).await?;
        if let Err(err) = session.authenticate(credentials).await {
            session.close().await;
            return Err(err);
        }
        Ok(session)
    }

    /// Establish the transport connection.
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.require("connect", SessionState::Disconnected)?;

        let addr = endpoint.resolve().await?;
        conn.teardown_link().await;
        debug!(host = %endpoint.host(), %addr, "connecting");
        conn.transport
            .connect(addr)
            .await
            .map_err(|status| SmbError::Transport(format!("Cannot reach {}: {}", addr, status)))?;

        conn.link_open = true;
        conn.state = SessionState::Connected;
        conn.endpoint = Some(endpoint.clone());
        info!(host = %endpoint.host(), %addr, "connected");
        Ok(())
    }

    /// Log in. On failure the session stays connected so the caller may retry.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.require("authenticate", SessionState::Connected)?;

        let outcome = conn
            .transport
            .login(
                &credentials.domain,
                &credentials.username,
                credentials.password(),
            )
            .await;
        match outcome {
            Ok(()) => {
                conn.state = SessionState::Authenticated;
                conn.logged_on = true;
                info!(username = %credentials.username, "authenticated");
                Ok(())
            }
            Err(status) if status.is_transport() => {
                conn.mark_disconnected();
                Err(SmbError::Transport(format!("login: {}", status)))
            }
            Err(status) => {
                warn!(username = %credentials.username, %status, "authentication failed");
                Err(SmbError::Auth {
                    username: credentials.username.clone(),
                    status,
                })
            }
        }
    }

    /// List the shares the server exposes. Informational only.
    pub async fn list_shares(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.lock().await;
        conn.require("list shares", SessionState::Authenticated)?;
        match conn.transport.list_shares().await {
            Ok(shares) => Ok(shares),
            Err(status) => Err(conn.fail_protocol("list shares", status)),
        }
    }

    /// Attach to a share.
    ///
    /// Only one share is attached at a time: attaching again detaches the
    /// previous share, and its [`ShareConnection`] starts failing with
    /// [`SmbError::SessionClosed`].
    pub async fn attach_share(&self, name: &str) -> Result<ShareConnection<T>> {
        let mut conn = self.conn.lock().await;
        conn.require("attach share", SessionState::Authenticated)?;
        conn.detach_share().await;

        let tree = match conn.transport.tree_connect(name).await {
            Ok(tree) => tree,
            Err(status) => return Err(conn.fail_protocol("attach share", status)),
        };
        conn.share = Some(AttachedShare {
            tree,
            name: name.to_string(),
        });
        info!(share = %name, "share attached");
        Ok(ShareConnection::new(
            Arc::clone(&self.conn),
            tree,
            conn.epoch,
            name.to_string(),
        ))
    }

    /// Detach the share, log off, and disconnect. Safe to call repeatedly and
    /// from any state; teardown failures are logged, not returned.
    pub async fn close(&self) {
        let mut conn = self.conn.lock().await;
        conn.detach_share().await;
        conn.teardown_link().await;
        conn.state = SessionState::Disconnected;
        conn.epoch += 1;
    }

    pub async fn state(&self) -> SessionState {
        self.conn.lock().await.state
    }

    /// Endpoint of the current (or last) connection.
    pub async fn endpoint(&self) -> Option<Endpoint> {
        self.conn.lock().await.endpoint.clone()
    }

    /// Name of the attached share, if any.
    pub async fn attached_share(&self) -> Option<String> {
        self.conn.lock().await.share.as_ref().map(|s| s.name.clone())
    }

    /// Number of close failures recorded while another error took precedence.
    pub async fn cleanup_failures(&self) -> u64 {
        self.conn.lock().await.cleanup_failures
    }

    /// Server's advertised maximum read size.
    pub async fn max_read_size(&self) -> u32 {
        self.conn.lock().await.transport.max_read_size()
    }

    /// Cap the chunk size used by whole-object reads.
    pub async fn set_read_chunk_size(&self, size: u32) {
        self.conn.lock().await.read_chunk_size = Some(size);
    }

    /// Install a callback invoked after every chunk read or written.
    pub async fn watch_progress(&self, callback: ProgressCallback) {
        self.conn.lock().await.progress_callback = Some(callback);
    }

    pub async fn clear_progress(&self) {
        self.conn.lock().await.progress_callback = None;
    }
}
