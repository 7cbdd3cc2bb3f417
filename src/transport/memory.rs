// ABOUTME: In-memory RemoteTransport with fault injection for tests and dry runs.
// ABOUTME: Keeps a path-keyed tree and records connects, attempts and committed moves.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::ready;
use std::path::Path;

use super::{
    LocalExists, ProgressFn, RemoteEntry, RemoteExists, RemoteMetadata, RemoteTransport, Result,
    TransferProgress, TransferStatus, TransportError,
};
use crate::retry::RetryPolicy;
use crate::types::RemotePath;

/// Transport operations that can be counted and faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    FileExists,
    DirectoryExists,
    Metadata,
    List,
    CreateDirectory,
    DeleteDirectory,
    DeleteFile,
    Upload,
    Download,
    Move,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::FileExists => "file_exists",
            Operation::DirectoryExists => "directory_exists",
            Operation::Metadata => "metadata",
            Operation::List => "list",
            Operation::CreateDirectory => "create_directory",
            Operation::DeleteDirectory => "delete_directory",
            Operation::DeleteFile => "delete_file",
            Operation::Upload => "upload_file",
            Operation::Download => "download_file",
            Operation::Move => "move_entry",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An injected failure.
///
/// ```
/// use slotswap::transport::{Fault, Operation};
///
/// // Fail the first two moves of `/site/b.txt`, then let it through.
/// let fault = Fault::on(Operation::Move).at("/site/b.txt").times(2);
/// ```
#[derive(Debug, Clone)]
pub struct Fault {
    operation: Operation,
    path: Option<RemotePath>,
    remaining: Option<u32>,
}

impl Fault {
    /// Fail every call of `operation`, on any path.
    pub fn on(operation: Operation) -> Self {
        Self {
            operation,
            path: None,
            remaining: None,
        }
    }

    /// Only fail calls whose primary path is `path`. For moves this is the source.
    pub fn at(mut self, path: impl Into<RemotePath>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Fail only the next `n` matching calls.
    pub fn times(mut self, n: u32) -> Self {
        self.remaining = Some(n);
        self
    }

    fn matches(&self, operation: Operation, path: &RemotePath) -> bool {
        self.operation == operation
            && self.remaining != Some(0)
            && self.path.as_ref().is_none_or(|p| p == path)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Directory { modified: DateTime<Utc> },
    File { contents: Bytes, modified: DateTime<Utc> },
}

impl Node {
    fn is_directory(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    fn entry(&self, path: &RemotePath) -> RemoteEntry {
        match self {
            Node::Directory { .. } => RemoteEntry::directory(path.clone()),
            Node::File { .. } => RemoteEntry::file(path.clone()),
        }
    }
}

#[derive(Debug)]
struct State {
    nodes: BTreeMap<RemotePath, Node>,
    connected: bool,
    connects: usize,
    attempts: HashMap<Operation, usize>,
    moves: Vec<(RemotePath, RemotePath)>,
    faults: Vec<Fault>,
}

impl State {
    fn children(&self, dir: &RemotePath) -> Vec<RemotePath> {
        self.nodes
            .keys()
            .filter(|p| p.parent().as_ref() == Some(dir))
            .cloned()
            .collect()
    }

    fn descendants(&self, dir: &RemotePath) -> Vec<RemotePath> {
        self.nodes
            .keys()
            .filter(|p| *p != dir && p.starts_with(dir))
            .cloned()
            .collect()
    }

    fn make_dirs(&mut self, path: &RemotePath) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(path.clone());
        while let Some(dir) = current {
            match self.nodes.get(&dir) {
                Some(node) if node.is_directory() => break,
                Some(_) => return Err(TransportError::NotADirectory(dir)),
                None => {
                    current = dir.parent();
                    missing.push(dir);
                }
            }
        }
        let now = Utc::now();
        for dir in missing {
            self.nodes.insert(dir, Node::Directory { modified: now });
        }
        Ok(())
    }
}

/// A RemoteTransport that keeps the whole remote tree in memory.
///
/// Retries use [`RetryPolicy::immediate`] by default so injected faults
/// exercise the retry path without sleeping.
pub struct MemoryTransport {
    state: Mutex<State>,
    retry: RetryPolicy,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryTransport")
            .field("nodes", &state.nodes.len())
            .field("connected", &state.connected)
            .finish()
    }
}

impl MemoryTransport {
    /// An empty tree containing only `/`.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            RemotePath::root(),
            Node::Directory {
                modified: Utc::now(),
            },
        );
        Self {
            state: Mutex::new(State {
                nodes,
                connected: false,
                connects: 0,
                attempts: HashMap::new(),
                moves: Vec::new(),
                faults: Vec::new(),
            }),
            retry: RetryPolicy::immediate(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Seed a file, creating its parent directories.
    pub fn with_file(self, path: impl Into<RemotePath>, contents: impl Into<Bytes>) -> Self {
        self.put_file(path, contents);
        self
    }

    /// Seed a directory and its parents.
    pub fn with_directory(self, path: impl Into<RemotePath>) -> Self {
        let path = path.into();
        // Seeding never conflicts with an existing file in test trees.
        let _ = self.state.lock().make_dirs(&path);
        self
    }

    pub fn with_fault(self, fault: Fault) -> Self {
        self.inject(fault);
        self
    }

    /// Write a file directly, bypassing faults and counters.
    pub fn put_file(&self, path: impl Into<RemotePath>, contents: impl Into<Bytes>) {
        let path = path.into();
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            let _ = state.make_dirs(&parent);
        }
        state.nodes.insert(
            path,
            Node::File {
                contents: contents.into(),
                modified: Utc::now(),
            },
        );
    }

    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Contents of a file, if it exists.
    pub fn read_file(&self, path: impl Into<RemotePath>) -> Option<Bytes> {
        match self.state.lock().nodes.get(&path.into()) {
            Some(Node::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl Into<RemotePath>) -> bool {
        self.state.lock().nodes.contains_key(&path.into())
    }

    /// Every file below `dir`, in path order.
    pub fn files_under(&self, dir: impl Into<RemotePath>) -> Vec<RemotePath> {
        let dir = dir.into();
        let state = self.state.lock();
        state
            .descendants(&dir)
            .into_iter()
            .filter(|p| matches!(state.nodes.get(p), Some(Node::File { .. })))
            .collect()
    }

    /// Number of real connections made. Repeated `connect` calls count once.
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Attempts made for `operation`, including failed and retried ones.
    pub fn attempts(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .attempts
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Successful moves, in commit order.
    pub fn moves(&self) -> Vec<(RemotePath, RemotePath)> {
        self.state.lock().moves.clone()
    }

    /// Count the attempt, fire a matching fault, or run `action`.
    fn attempt<R>(
        &self,
        operation: Operation,
        path: &RemotePath,
        action: &mut impl FnMut(&mut State) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.lock();
        *state.attempts.entry(operation).or_default() += 1;

        if let Some(fault) = state
            .faults
            .iter_mut()
            .find(|f| f.matches(operation, path))
        {
            if let Some(remaining) = fault.remaining.as_mut() {
                *remaining -= 1;
            }
            return Err(TransportError::Remote {
                operation: operation.name(),
                path: path.clone(),
                message: "injected fault".to_string(),
            });
        }

        action(&mut *state)
    }

    async fn perform<R>(
        &self,
        operation: Operation,
        path: &RemotePath,
        mut action: impl FnMut(&mut State) -> Result<R>,
    ) -> Result<R> {
        self.connect().await?;
        let action = &mut action;
        self.retry
            .execute(operation.name(), || {
                ready(self.attempt(operation, path, &mut *action))
            })
            .await
    }
}

#[async_trait]
impl RemoteTransport for MemoryTransport {
    async fn connect(&self) -> Result<()> {
        let root = RemotePath::root();
        self.retry
            .execute(Operation::Connect.name(), || {
                ready(self.attempt(Operation::Connect, &root, &mut |state: &mut State| {
                    if !state.connected {
                        state.connected = true;
                        state.connects += 1;
                    }
                    Ok(())
                }))
            })
            .await
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.lock().connected = false;
        Ok(())
    }

    async fn file_exists(&self, path: &RemotePath) -> Result<bool> {
        self.perform(Operation::FileExists, path, |state| {
            Ok(matches!(state.nodes.get(path), Some(Node::File { .. })))
        })
        .await
    }

    async fn directory_exists(&self, path: &RemotePath) -> Result<bool> {
        self.perform(Operation::DirectoryExists, path, |state| {
            Ok(state.nodes.get(path).is_some_and(Node::is_directory))
        })
        .await
    }

    async fn metadata(&self, path: &RemotePath) -> Result<RemoteMetadata> {
        self.perform(Operation::Metadata, path, |state| match state.nodes.get(path) {
            Some(Node::File { contents, modified }) => Ok(RemoteMetadata {
                size: Some(contents.len() as u64),
                modified: Some(*modified),
            }),
            Some(Node::Directory { modified }) => Ok(RemoteMetadata {
                size: None,
                modified: Some(*modified),
            }),
            None => Err(TransportError::NotFound(path.clone())),
        })
        .await
    }

    async fn list(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        self.perform(Operation::List, path, |state| match state.nodes.get(path) {
            Some(Node::Directory { .. }) => Ok(state
                .children(path)
                .iter()
                .filter_map(|child| state.nodes.get(child).map(|node| node.entry(child)))
                .collect()),
            Some(Node::File { .. }) => Err(TransportError::NotADirectory(path.clone())),
            None => Err(TransportError::NotFound(path.clone())),
        })
        .await
    }

    async fn create_directory(&self, path: &RemotePath) -> Result<()> {
        self.perform(Operation::CreateDirectory, path, |state| {
            state.make_dirs(path)
        })
        .await
    }

    async fn delete_directory(&self, path: &RemotePath, recursive: bool) -> Result<()> {
        self.perform(Operation::DeleteDirectory, path, |state| {
            match state.nodes.get(path) {
                None => return Ok(()),
                Some(Node::File { .. }) => return Err(TransportError::NotADirectory(path.clone())),
                Some(Node::Directory { .. }) => {}
            }

            let descendants = state.descendants(path);
            if !recursive && !descendants.is_empty() {
                return Err(TransportError::Remote {
                    operation: Operation::DeleteDirectory.name(),
                    path: path.clone(),
                    message: "directory not empty".to_string(),
                });
            }
            for descendant in descendants {
                state.nodes.remove(&descendant);
            }
            if !path.is_root() {
                state.nodes.remove(path);
            }
            Ok(())
        })
        .await
    }

    async fn delete_file(&self, path: &RemotePath) -> Result<()> {
        self.perform(Operation::DeleteFile, path, |state| match state.nodes.get(path) {
            None => Ok(()),
            Some(Node::Directory { .. }) => Err(TransportError::Remote {
                operation: Operation::DeleteFile.name(),
                path: path.clone(),
                message: "is a directory".to_string(),
            }),
            Some(Node::File { .. }) => {
                state.nodes.remove(path);
                Ok(())
            }
        })
        .await
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        exists: RemoteExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        let contents = Bytes::from(
            tokio::fs::read(local)
                .await
                .map_err(|e| TransportError::local(local, e))?,
        );

        let status = self
            .perform(Operation::Upload, remote, |state| {
                match (state.nodes.get(remote), exists) {
                    (Some(Node::Directory { .. }), _) => {
                        return Err(TransportError::AlreadyExists(remote.clone()));
                    }
                    (Some(Node::File { .. }), RemoteExists::Skip) => {
                        return Ok(TransferStatus::Skipped);
                    }
                    (Some(Node::File { .. }), RemoteExists::Fail) => {
                        return Err(TransportError::AlreadyExists(remote.clone()));
                    }
                    _ => {}
                }
                if let Some(parent) = remote.parent() {
                    state.make_dirs(&parent)?;
                }
                state.nodes.insert(
                    remote.clone(),
                    Node::File {
                        contents: contents.clone(),
                        modified: Utc::now(),
                    },
                );
                Ok(TransferStatus::Transferred)
            })
            .await?;

        if status == TransferStatus::Transferred
            && let Some(report) = progress
        {
            report(&TransferProgress::new(local.to_path_buf(), remote.clone(), 1, 1));
        }
        Ok(status)
    }

    async fn download_file(
        &self,
        remote: &RemotePath,
        local: &Path,
        exists: LocalExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        if exists == LocalExists::Skip && local.exists() {
            return Ok(TransferStatus::Skipped);
        }

        let contents = self
            .perform(Operation::Download, remote, |state| match state.nodes.get(remote) {
                Some(Node::File { contents, .. }) => Ok(contents.clone()),
                Some(Node::Directory { .. }) => Err(TransportError::Remote {
                    operation: Operation::Download.name(),
                    path: remote.clone(),
                    message: "is a directory".to_string(),
                }),
                None => Err(TransportError::NotFound(remote.clone())),
            })
            .await?;

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransportError::local(parent, e))?;
        }
        tokio::fs::write(local, &contents)
            .await
            .map_err(|e| TransportError::local(local, e))?;

        if let Some(report) = progress {
            report(&TransferProgress::new(local.to_path_buf(), remote.clone(), 1, 1));
        }
        Ok(TransferStatus::Transferred)
    }

    async fn move_entry(&self, from: &RemotePath, to: &RemotePath) -> Result<()> {
        self.perform(Operation::Move, from, |state| {
            let node = state
                .nodes
                .get(from)
                .cloned()
                .ok_or_else(|| TransportError::NotFound(from.clone()))?;
            if state.nodes.contains_key(to) {
                return Err(TransportError::AlreadyExists(to.clone()));
            }
            let parent = to.parent().unwrap_or_else(RemotePath::root);
            if !state.nodes.get(&parent).is_some_and(Node::is_directory) {
                return Err(TransportError::NotFound(parent));
            }
            if to.starts_with(from) {
                return Err(TransportError::Remote {
                    operation: Operation::Move.name(),
                    path: from.clone(),
                    message: format!("cannot move into itself: {}", to),
                });
            }

            for descendant in state.descendants(from) {
                if let (Some(child), Some(target)) = (
                    state.nodes.remove(&descendant),
                    descendant.rebase(from, to),
                ) {
                    state.nodes.insert(target, child);
                }
            }
            state.nodes.remove(from);
            state.nodes.insert(to.clone(), node);
            state.moves.push((from.clone(), to.clone()));
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_is_idempotent() {
        let transport = MemoryTransport::new();
        transport.connect().await.unwrap();
        transport.connect().await.unwrap();
        transport.directory_exists(&RemotePath::root()).await.unwrap();
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn reconnects_after_disconnect() {
        let transport = MemoryTransport::new();
        transport.connect().await.unwrap();
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
        transport.connect().await.unwrap();
        assert_eq!(transport.connects(), 2);
    }

    #[tokio::test]
    async fn move_carries_descendants() {
        let transport = MemoryTransport::new()
            .with_file("/site/assets/app.js", "js")
            .with_directory("/site/backup");
        transport
            .move_entry(
                &RemotePath::new("/site/assets"),
                &RemotePath::new("/site/backup/assets"),
            )
            .await
            .unwrap();
        assert!(!transport.exists("/site/assets"));
        assert_eq!(
            transport.read_file("/site/backup/assets/app.js"),
            Some(Bytes::from("js"))
        );
    }

    #[tokio::test]
    async fn move_rejects_existing_destination() {
        let transport = MemoryTransport::new()
            .with_file("/a.txt", "a")
            .with_file("/b.txt", "b");
        let err = transport
            .move_entry(&RemotePath::new("/a.txt"), &RemotePath::new("/b.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::AlreadyExists(_)));
        assert!(transport.moves().is_empty());
    }

    #[tokio::test]
    async fn move_requires_destination_parent() {
        let transport = MemoryTransport::new().with_file("/a.txt", "a");
        let err = transport
            .move_entry(&RemotePath::new("/a.txt"), &RemotePath::new("/missing/a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotFound(p) if p.as_str() == "/missing"));
    }

    #[tokio::test]
    async fn transient_fault_is_retried() {
        let transport = MemoryTransport::new()
            .with_file("/a.txt", "a")
            .with_fault(Fault::on(Operation::FileExists).times(2));
        assert!(transport.file_exists(&RemotePath::new("/a.txt")).await.unwrap());
        assert_eq!(transport.attempts(Operation::FileExists), 3);
    }

    #[tokio::test]
    async fn persistent_fault_surfaces_after_retries() {
        let transport = MemoryTransport::new().with_fault(Fault::on(Operation::List));
        let err = transport.list(&RemotePath::root()).await.unwrap_err();
        assert!(matches!(err, TransportError::Remote { operation: "list", .. }));
        assert_eq!(transport.attempts(Operation::List), 4);
    }

    #[tokio::test]
    async fn fault_at_path_leaves_other_paths_alone() {
        let transport = MemoryTransport::new()
            .with_file("/a.txt", "a")
            .with_file("/b.txt", "b")
            .with_fault(Fault::on(Operation::Metadata).at("/b.txt"));
        assert!(transport.metadata(&RemotePath::new("/a.txt")).await.is_ok());
        assert!(transport.metadata(&RemotePath::new("/b.txt")).await.is_err());
    }

    #[tokio::test]
    async fn non_recursive_delete_refuses_non_empty_directory() {
        let transport = MemoryTransport::new().with_file("/d/f", "x");
        let d = RemotePath::new("/d");
        assert!(transport.delete_directory(&d, false).await.is_err());
        transport.delete_directory(&d, true).await.unwrap();
        assert!(!transport.exists("/d"));
        // absent directory is a no-op
        transport.delete_directory(&d, true).await.unwrap();
    }

    #[tokio::test]
    async fn listing_is_single_level() {
        let transport = MemoryTransport::new()
            .with_file("/site/index.html", "i")
            .with_file("/site/assets/app.js", "a");
        let entries = transport.list(&RemotePath::new("/site")).await.unwrap();
        assert_eq!(
            entries,
            vec![
                RemoteEntry::directory("/site/assets"),
                RemoteEntry::file("/site/index.html"),
            ]
        );
    }
}
