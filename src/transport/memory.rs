//! In-process file server used as a transport double.
//!
//! `MemoryTransport` keeps a tree of shares in memory and answers every
//! request with the status a real server would give for the same situation:
//! sharing conflicts, delete-pending objects, non-empty directories, short
//! final reads. Clones share the same server state, so a test can keep one
//! clone for inspection while the session owns another.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{FileId, RawEntry, StatusResult, Transport, TreeId};
use crate::fs::path::{file_name, normalize_path, parent_path};
use crate::protocol::{
    AccessMask, CreateDisposition, CreateRequest, FileAttributes, NtStatus, ObjectKind,
    ShareAccess,
};

/// Default read/write limit advertised by the simulated server.
pub const DEFAULT_MAX_IO_SIZE: u32 = 64 * 1024;

/// Request kinds that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Connect,
    Login,
    ListShares,
    TreeConnect,
    Create,
    Read,
    Write,
    QueryDirectory,
    SetDeletePending,
    Close,
}

/// Request counters, for open/close parity assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Successful creates
    pub opens: u64,
    /// Close requests, successful or not
    pub closes: u64,
    pub reads: u64,
    pub writes: u64,
    pub enumerations: u64,
    pub disposition_sets: u64,
}

#[derive(Debug, Clone)]
struct MemNode {
    kind: ObjectKind,
    data: Vec<u8>,
    attributes: FileAttributes,
    delete_pending: bool,
}

impl MemNode {
    fn directory() -> Self {
        Self {
            kind: ObjectKind::Directory,
            data: Vec::new(),
            attributes: FileAttributes::DIRECTORY,
            delete_pending: false,
        }
    }

    fn file(data: Vec<u8>, attributes: FileAttributes) -> Self {
        Self {
            kind: ObjectKind::File,
            data,
            attributes,
            delete_pending: false,
        }
    }
}

#[derive(Debug, Default)]
struct ShareTree {
    /// Keyed by normalized path; the root ("") is implicit.
    nodes: BTreeMap<String, MemNode>,
}

impl ShareTree {
    fn is_directory(&self, path: &str) -> bool {
        path.is_empty()
            || self
                .nodes
                .get(path)
                .is_some_and(|n| n.kind == ObjectKind::Directory)
    }

    fn has_children(&self, path: &str) -> bool {
        self.nodes.keys().any(|key| key != path && parent_path(key) == path)
    }

    fn children(&self, path: &str) -> impl Iterator<Item = (&String, &MemNode)> {
        self.nodes
            .iter()
            .filter(move |(key, _)| key.as_str() != path && parent_path(key) == path)
    }

    fn insert_with_parents(&mut self, path: &str, node: MemNode) {
        let mut parent = parent_path(path);
        let mut missing = Vec::new();
        while !parent.is_empty() && !self.nodes.contains_key(parent) {
            missing.push(parent.to_string());
            parent = parent_path(parent);
        }
        for dir in missing {
            self.nodes.insert(dir, MemNode::directory());
        }
        self.nodes.insert(path.to_string(), node);
    }
}

#[derive(Debug, Clone)]
struct OpenFile {
    tree: TreeId,
    share: String,
    path: String,
    access: AccessMask,
    share_access: ShareAccess,
}

#[derive(Debug)]
struct ServerState {
    reachable: bool,
    connected: bool,
    logged_in: bool,
    accounts: HashMap<String, String>,
    shares: BTreeMap<String, ShareTree>,
    trees: HashMap<TreeId, String>,
    opens: HashMap<FileId, OpenFile>,
    /// Opens held by other (simulated) clients: (share, path, share access)
    foreign_locks: Vec<(String, String, ShareAccess)>,
    denied: Vec<(String, String)>,
    faults: HashMap<FaultPoint, VecDeque<NtStatus>>,
    next_tree: u32,
    next_file: u64,
    max_read: u32,
    max_write: u32,
    empty_read_at_eof: bool,
    stats: TransportStats,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            reachable: true,
            connected: false,
            logged_in: false,
            accounts: HashMap::new(),
            shares: BTreeMap::new(),
            trees: HashMap::new(),
            opens: HashMap::new(),
            foreign_locks: Vec::new(),
            denied: Vec::new(),
            faults: HashMap::new(),
            next_tree: 1,
            next_file: 1,
            max_read: DEFAULT_MAX_IO_SIZE,
            max_write: DEFAULT_MAX_IO_SIZE,
            empty_read_at_eof: false,
            stats: TransportStats::default(),
        }
    }
}

impl ServerState {
    fn take_fault(&mut self, point: FaultPoint) -> StatusResult<()> {
        match self.faults.get_mut(&point).and_then(VecDeque::pop_front) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn require_connected(&self) -> StatusResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(NtStatus::ConnectionDisconnected)
        }
    }

    fn require_session(&self) -> StatusResult<()> {
        self.require_connected()?;
        if self.logged_in {
            Ok(())
        } else {
            Err(NtStatus::AccessDenied)
        }
    }

    fn share_for_tree(&self, tree: TreeId) -> StatusResult<String> {
        self.require_session()?;
        self.trees
            .get(&tree)
            .cloned()
            .ok_or(NtStatus::NetworkNameDeleted)
    }

    fn open_for(&self, tree: TreeId, file: FileId) -> StatusResult<OpenFile> {
        self.share_for_tree(tree)?;
        match self.opens.get(&file) {
            Some(open) if open.tree == tree => Ok(open.clone()),
            _ => Err(NtStatus::FileClosed),
        }
    }

    fn sharing_conflict(&self, share: &str, path: &str, request: &CreateRequest) -> bool {
        let ours = self
            .opens
            .values()
            .filter(|o| o.share == share && o.path == path)
            .map(|o| (o.access, o.share_access));
        let foreign = self
            .foreign_locks
            .iter()
            .filter(|(s, p, _)| s == share && p == path)
            .map(|(_, _, share_access)| (AccessMask::GENERIC_ALL, *share_access));

        ours.chain(foreign).any(|(access, share_access)| {
            !permits(share_access, request.access) || !permits(request.share_access, access)
        })
    }

    fn create(&mut self, tree: TreeId, request: &CreateRequest) -> StatusResult<FileId> {
        let share_name = self.share_for_tree(tree)?;
        let path = normalize_path(&request.path);

        if self
            .denied
            .iter()
            .any(|(s, p)| *s == share_name && *p == path)
        {
            return Err(NtStatus::AccessDenied);
        }

        let conflict = self.sharing_conflict(&share_name, &path, request);
        let share = self
            .shares
            .get_mut(&share_name)
            .ok_or(NtStatus::NetworkNameDeleted)?;

        if !share.is_directory(parent_path(&path)) {
            return Err(NtStatus::ObjectPathNotFound);
        }

        let exists = path.is_empty() || share.nodes.contains_key(&path);
        if exists {
            let (kind, delete_pending) = match share.nodes.get(&path) {
                Some(node) => (node.kind, node.delete_pending),
                None => (ObjectKind::Directory, false),
            };
            if delete_pending {
                return Err(NtStatus::DeletePending);
            }
            if request.disposition == CreateDisposition::CreateNew {
                return Err(NtStatus::ObjectNameCollision);
            }
            match (request.kind, kind) {
                (ObjectKind::File, ObjectKind::Directory) => {
                    return Err(NtStatus::FileIsADirectory);
                }
                (ObjectKind::Directory, ObjectKind::File) => {
                    return Err(NtStatus::NotADirectory);
                }
                _ => {}
            }
            if conflict {
                return Err(NtStatus::SharingViolation);
            }
            if request.disposition == CreateDisposition::OverwriteOrCreate {
                if let Some(node) = share.nodes.get_mut(&path) {
                    node.data.clear();
                }
            }
        } else {
            if !request.disposition.may_create() {
                return Err(NtStatus::ObjectNameNotFound);
            }
            let node = match request.kind {
                ObjectKind::Directory => MemNode::directory(),
                ObjectKind::File => {
                    let attributes = if request.attributes.is_empty() {
                        FileAttributes::NORMAL
                    } else {
                        request.attributes - FileAttributes::DIRECTORY
                    };
                    MemNode::file(Vec::new(), attributes)
                }
            };
            share.nodes.insert(path.clone(), node);
        }

        let id = FileId(self.next_file);
        self.next_file += 1;
        self.opens.insert(
            id,
            OpenFile {
                tree,
                share: share_name,
                path,
                access: request.access,
                share_access: request.share_access,
            },
        );
        self.stats.opens += 1;
        Ok(id)
    }

    fn node(&self, open: &OpenFile) -> StatusResult<&MemNode> {
        self.shares
            .get(&open.share)
            .and_then(|s| s.nodes.get(&open.path))
            .ok_or(NtStatus::FileClosed)
    }

    fn node_mut(&mut self, open: &OpenFile) -> StatusResult<&mut MemNode> {
        self.shares
            .get_mut(&open.share)
            .and_then(|s| s.nodes.get_mut(&open.path))
            .ok_or(NtStatus::FileClosed)
    }

    fn read(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        length: u32,
    ) -> StatusResult<Vec<u8>> {
        let open = self.open_for(tree, file)?;
        if !open.access.grants_read() {
            return Err(NtStatus::AccessDenied);
        }
        if length > self.max_read {
            return Err(NtStatus::InvalidParameter);
        }
        let empty_read_at_eof = self.empty_read_at_eof;
        let node = self.node(&open)?;
        if node.kind == ObjectKind::Directory {
            return Err(NtStatus::FileIsADirectory);
        }
        let len = node.data.len() as u64;
        if offset >= len {
            return if empty_read_at_eof {
                Ok(Vec::new())
            } else {
                Err(NtStatus::EndOfFile)
            };
        }
        let start = offset as usize;
        let end = (offset + u64::from(length)).min(len) as usize;
        Ok(node.data[start..end].to_vec())
    }

    fn write(&mut self, tree: TreeId, file: FileId, offset: u64, data: &[u8]) -> StatusResult<u32> {
        let open = self.open_for(tree, file)?;
        if !open.access.grants_write() {
            return Err(NtStatus::AccessDenied);
        }
        let written = u32::try_from(data.len()).map_err(|_| NtStatus::InvalidParameter)?;
        if written > self.max_write {
            return Err(NtStatus::InvalidParameter);
        }
        let node = self.node_mut(&open)?;
        if node.kind == ObjectKind::Directory {
            return Err(NtStatus::FileIsADirectory);
        }
        let start = offset as usize;
        let end = start + data.len();
        if node.data.len() < end {
            node.data.resize(end, 0);
        }
        node.data[start..end].copy_from_slice(data);
        Ok(written)
    }

    fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        pattern: &str,
    ) -> StatusResult<Vec<RawEntry>> {
        let open = self.open_for(tree, file)?;
        if !open.access.grants_read() {
            return Err(NtStatus::AccessDenied);
        }
        let share = self
            .shares
            .get(&open.share)
            .ok_or(NtStatus::NetworkNameDeleted)?;
        if !share.is_directory(&open.path) {
            return Err(NtStatus::NotADirectory);
        }

        let dots = [".", ".."].into_iter().map(|name| RawEntry {
            file_name: name.to_string(),
            attributes: FileAttributes::DIRECTORY,
            end_of_file: 0,
        });
        let children = share.children(&open.path).map(|(key, node)| RawEntry {
            file_name: file_name(key).to_string(),
            attributes: node.attributes,
            end_of_file: node.data.len() as u64,
        });

        let entries: Vec<RawEntry> = dots
            .chain(children)
            .filter(|entry| matches_pattern(pattern, &entry.file_name))
            .collect();
        if entries.is_empty() {
            return Err(NtStatus::NoMoreFiles);
        }
        Ok(entries)
    }

    fn set_delete_pending(
        &mut self,
        tree: TreeId,
        file: FileId,
        delete_pending: bool,
    ) -> StatusResult<()> {
        let open = self.open_for(tree, file)?;
        if !open.access.grants_delete() {
            return Err(NtStatus::AccessDenied);
        }
        if open.path.is_empty() {
            return Err(NtStatus::AccessDenied);
        }
        let share = self
            .shares
            .get_mut(&open.share)
            .ok_or(NtStatus::NetworkNameDeleted)?;
        if delete_pending && share.has_children(&open.path) {
            return Err(NtStatus::DirectoryNotEmpty);
        }
        let node = share.nodes.get_mut(&open.path).ok_or(NtStatus::FileClosed)?;
        node.delete_pending = delete_pending;
        Ok(())
    }

    fn close(&mut self, tree: TreeId, file: FileId) -> StatusResult<()> {
        let open = self.open_for(tree, file)?;
        self.opens.remove(&file);

        let still_open = self
            .opens
            .values()
            .any(|o| o.share == open.share && o.path == open.path);
        if still_open {
            return Ok(());
        }
        if let Some(share) = self.shares.get_mut(&open.share) {
            let pending = share
                .nodes
                .get(&open.path)
                .is_some_and(|node| node.delete_pending);
            if pending && !share.has_children(&open.path) {
                share.nodes.remove(&open.path);
                debug!(share = %open.share, path = %open.path, "object deleted on close");
            }
        }
        Ok(())
    }

    fn drop_tree(&mut self, tree: TreeId) {
        self.trees.remove(&tree);
        self.opens.retain(|_, open| open.tree != tree);
    }
}

/// Whether a holder granting `granted` sharing tolerates an open asking for `access`.
fn permits(granted: ShareAccess, access: AccessMask) -> bool {
    (!access.grants_read() || granted.contains(ShareAccess::READ))
        && (!access.grants_write() || granted.contains(ShareAccess::WRITE))
        && (!access.grants_delete() || granted.contains(ShareAccess::DELETE))
}

/// Minimal wildcard matching: `*`, `prefix*`, `*suffix`, or an exact name.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    if pattern.is_empty() || pattern == "*" {
        return true;
    }
    match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
        (Some(suffix), _) => name.ends_with(suffix),
        (None, Some(prefix)) => name.starts_with(prefix),
        (None, None) => name == pattern,
    }
}

/// Simulated file server implementing [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryTransport {
    /// Create an empty, reachable server with no accounts and no shares.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept this username/password pair at login.
    pub fn with_account(self, username: &str, password: &str) -> Self {
        self.state()
            .accounts
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Add an empty share.
    pub fn with_share(self, name: &str) -> Self {
        self.state().shares.entry(name.to_string()).or_default();
        self
    }

    /// Add a file (and any missing parent directories) to a share.
    pub fn with_file(self, share: &str, path: &str, data: &[u8]) -> Self {
        self.add_file(share, path, data);
        self
    }

    /// Add a directory (and any missing parents) to a share.
    pub fn with_directory(self, share: &str, path: &str) -> Self {
        self.add_directory(share, path);
        self
    }

    pub fn with_max_read_size(self, size: u32) -> Self {
        self.state().max_read = size;
        self
    }

    pub fn with_max_write_size(self, size: u32) -> Self {
        self.state().max_write = size;
        self
    }

    /// Answer reads past the end with an empty chunk instead of `EndOfFile`.
    pub fn with_empty_reads_at_eof(self) -> Self {
        self.state().empty_read_at_eof = true;
        self
    }

    /// Refuse every connection attempt.
    pub fn unreachable(self) -> Self {
        self.state().reachable = false;
        self
    }

    pub fn add_file(&self, share: &str, path: &str, data: &[u8]) {
        let path = normalize_path(path);
        self.state()
            .shares
            .entry(share.to_string())
            .or_default()
            .insert_with_parents(&path, MemNode::file(data.to_vec(), FileAttributes::ARCHIVE));
    }

    pub fn add_directory(&self, share: &str, path: &str) {
        let path = normalize_path(path);
        if path.is_empty() {
            return;
        }
        self.state()
            .shares
            .entry(share.to_string())
            .or_default()
            .insert_with_parents(&path, MemNode::directory());
    }

    /// Add an entry that is neither a plain file nor a directory.
    pub fn add_device(&self, share: &str, path: &str) {
        let path = normalize_path(path);
        self.state()
            .shares
            .entry(share.to_string())
            .or_default()
            .insert_with_parents(&path, MemNode::file(Vec::new(), FileAttributes::DEVICE));
    }

    /// Simulate another client holding the object open with the given sharing.
    pub fn lock(&self, share: &str, path: &str, share_access: ShareAccess) {
        self.state()
            .foreign_locks
            .push((share.to_string(), normalize_path(path), share_access));
    }

    /// Release every lock taken with [`MemoryTransport::lock`].
    pub fn unlock_all(&self) {
        self.state().foreign_locks.clear();
    }

    /// Deny all opens of this path.
    pub fn deny(&self, share: &str, path: &str) {
        self.state()
            .denied
            .push((share.to_string(), normalize_path(path)));
    }

    /// Make the next request of this kind fail with `status`.
    pub fn fail_next(&self, point: FaultPoint, status: NtStatus) {
        self.state().faults.entry(point).or_default().push_back(status);
    }

    /// Simulate the link dropping: every further request fails.
    pub fn drop_connection(&self) {
        let mut state = self.state();
        state.connected = false;
        state.logged_in = false;
        state.trees.clear();
        state.opens.clear();
    }

    pub fn stats(&self) -> TransportStats {
        self.state().stats
    }

    /// Number of handles currently open on the server.
    pub fn open_handles(&self) -> usize {
        self.state().opens.len()
    }

    /// Check if a path exists in a share.
    pub fn exists(&self, share: &str, path: &str) -> bool {
        let path = normalize_path(path);
        self.state()
            .shares
            .get(share)
            .is_some_and(|s| path.is_empty() || s.nodes.contains_key(&path))
    }

    /// Contents of a file, if it exists.
    pub fn file_contents(&self, share: &str, path: &str) -> Option<Vec<u8>> {
        let path = normalize_path(path);
        self.state()
            .shares
            .get(share)
            .and_then(|s| s.nodes.get(&path))
            .filter(|node| node.kind == ObjectKind::File)
            .map(|node| node.data.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().logged_in
    }
}

impl Transport for MemoryTransport {
    fn max_read_size(&self) -> u32 {
        self.state().max_read
    }

    fn max_write_size(&self) -> u32 {
        self.state().max_write
    }

    async fn connect(&mut self, addr: SocketAddr) -> StatusResult<()> {
        let mut state = self.state();
        state.take_fault(FaultPoint::Connect)?;
        if !state.reachable {
            return Err(NtStatus::HostUnreachable);
        }
        debug!(%addr, "memory server accepted connection");
        state.connected = true;
        Ok(())
    }

    async fn login(&mut self, _domain: &str, username: &str, password: &str) -> StatusResult<()> {
        let mut state = self.state();
        state.require_connected()?;
        state.take_fault(FaultPoint::Login)?;
        match state.accounts.get(username) {
            Some(expected) if expected == password => {
                state.logged_in = true;
                Ok(())
            }
            _ => Err(NtStatus::LogonFailure),
        }
    }

    async fn list_shares(&mut self) -> StatusResult<Vec<String>> {
        let mut state = self.state();
        state.require_session()?;
        state.take_fault(FaultPoint::ListShares)?;
        Ok(state.shares.keys().cloned().collect())
    }

    async fn tree_connect(&mut self, share: &str) -> StatusResult<TreeId> {
        let mut state = self.state();
        state.require_session()?;
        state.take_fault(FaultPoint::TreeConnect)?;
        if !state.shares.contains_key(share) {
            return Err(NtStatus::BadNetworkName);
        }
        let id = TreeId(state.next_tree);
        state.next_tree += 1;
        state.trees.insert(id, share.to_string());
        Ok(id)
    }

    async fn create(&mut self, tree: TreeId, request: &CreateRequest) -> StatusResult<FileId> {
        let mut state = self.state();
        state.require_session()?;
        state.take_fault(FaultPoint::Create)?;
        state.create(tree, request)
    }

    async fn read(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        length: u32,
    ) -> StatusResult<Vec<u8>> {
        let mut state = self.state();
        state.require_connected()?;
        state.stats.reads += 1;
        state.take_fault(FaultPoint::Read)?;
        state.read(tree, file, offset, length)
    }

    async fn write(
        &mut self,
        tree: TreeId,
        file: FileId,
        offset: u64,
        data: &[u8],
    ) -> StatusResult<u32> {
        let mut state = self.state();
        state.require_connected()?;
        state.stats.writes += 1;
        state.take_fault(FaultPoint::Write)?;
        state.write(tree, file, offset, data)
    }

    async fn query_directory(
        &mut self,
        tree: TreeId,
        file: FileId,
        pattern: &str,
    ) -> StatusResult<Vec<RawEntry>> {
        let mut state = self.state();
        state.require_connected()?;
        state.stats.enumerations += 1;
        state.take_fault(FaultPoint::QueryDirectory)?;
        state.query_directory(tree, file, pattern)
    }

    async fn set_delete_pending(
        &mut self,
        tree: TreeId,
        file: FileId,
        delete_pending: bool,
    ) -> StatusResult<()> {
        let mut state = self.state();
        state.require_connected()?;
        state.stats.disposition_sets += 1;
        state.take_fault(FaultPoint::SetDeletePending)?;
        state.set_delete_pending(tree, file, delete_pending)
    }

    async fn close(&mut self, tree: TreeId, file: FileId) -> StatusResult<()> {
        let mut state = self.state();
        state.require_connected()?;
        state.stats.closes += 1;
        if let Err(status) = state.take_fault(FaultPoint::Close) {
            // The server still tears the handle down; only the reply is lost.
            state.opens.remove(&file);
            return Err(status);
        }
        state.close(tree, file)
    }

    async fn tree_disconnect(&mut self, tree: TreeId) -> StatusResult<()> {
        let mut state = self.state();
        state.require_connected()?;
        if !state.trees.contains_key(&tree) {
            return Err(NtStatus::NetworkNameDeleted);
        }
        state.drop_tree(tree);
        Ok(())
    }

    async fn logoff(&mut self) -> StatusResult<()> {
        let mut state = self.state();
        state.require_connected()?;
        state.logged_in = false;
        state.trees.clear();
        state.opens.clear();
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut state = self.state();
        state.connected = false;
        state.logged_in = false;
        state.trees.clear();
        state.opens.clear();
    }
}
