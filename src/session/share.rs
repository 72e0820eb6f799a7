//! Connection to an attached share.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::session::Connection;
use crate::error::Result;
use crate::transport::{Transport, TreeId};

/// A share attached through [`crate::Session::attach_share`].
///
/// All paths passed to its operations are relative to the share root and may
/// use either `/` or `\` separators. The connection stops working (every
/// operation fails with [`crate::SmbError::SessionClosed`]) once the session
/// closes, another share is attached, or the transport fails.
pub struct ShareConnection<T: Transport> {
    conn: Arc<Mutex<Connection<T>>>,
    pub(crate) tree: TreeId,
    pub(crate) epoch: u64,
    name: String,
}

impl<T: Transport> ShareConnection<T> {
    pub(crate) fn new(
        conn: Arc<Mutex<Connection<T>>>,
        tree: TreeId,
        epoch: u64,
        name: String,
    ) -> Self {
        Self {
            conn,
            tree,
            epoch,
            name,
        }
    }

    /// Share name as passed to `attach_share`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the connection, failing if this share is no longer attached.
    pub(crate) async fn lock(&self) -> Result<MutexGuard<'_, Connection<T>>> {
        let conn = self.conn.lock().await;
        conn.require_live(self.epoch)?;
        Ok(conn)
    }

    /// Lock the connection without the liveness check. Used to release
    /// handles, which must be marked closed even when the share is gone.
    pub(crate) async fn lock_for_release(&self) -> MutexGuard<'_, Connection<T>> {
        self.conn.lock().await
    }

    /// Check whether this share is still attached to a live session.
    pub async fn is_attached(&self) -> bool {
        self.lock().await.is_ok()
    }
}

impl<T: Transport> fmt::Debug for ShareConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConnection")
            .field("name", &self.name)
            .field("tree", &self.tree)
            .finish()
    }
}
