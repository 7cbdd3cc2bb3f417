// ABOUTME: Remote file transport abstraction used by the deployment orchestrator.
// ABOUTME: Defines the RemoteTransport trait, listing types, transfer options and errors.

mod error;
mod memory;
mod ssh;
mod transfer;

pub use error::{Result, TransportError};
pub use memory::{Fault, MemoryTransport, Operation};
pub use ssh::SshTransport;
pub use transfer::{
    DEFAULT_PARALLELISM, MAX_PARALLELISM, clamp_parallelism, download_batch, download_tree,
    upload_batch, upload_tree,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::types::RemotePath;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a single-level remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub path: RemotePath,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn file(path: impl Into<RemotePath>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(path: impl Into<RemotePath>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Size and modification time of a remote entry. Either may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteMetadata {
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

/// What to do when an upload target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteExists {
    #[default]
    Overwrite,
    Skip,
    Fail,
}

/// What to do when a download target already exists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalExists {
    #[default]
    Overwrite,
    Skip,
}

/// How a tree transfer treats content already at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Copy over whatever is there, leaving extra files in place.
    #[default]
    Update,
    /// Empty the destination first so it ends up identical to the source.
    Mirror,
}

/// Whether a single transfer moved bytes or was skipped by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Transferred,
    Skipped,
}

/// Counts for a batch or tree transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSummary {
    pub transferred: usize,
    pub skipped: usize,
}

impl TransferSummary {
    pub fn total(&self) -> usize {
        self.transferred + self.skipped
    }

    pub(crate) fn record(&mut self, status: TransferStatus) {
        match status {
            TransferStatus::Transferred => self.transferred += 1,
            TransferStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Progress notification emitted after each completed file.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub local: PathBuf,
    pub remote: RemotePath,
    /// Share of files finished, 0.0 to 100.0.
    pub percent: f64,
    pub completed: usize,
    pub total: usize,
}

impl TransferProgress {
    pub fn new(local: PathBuf, remote: RemotePath, completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Self {
            local,
            remote,
            percent,
            completed,
            total,
        }
    }
}

/// Progress sink shared by concurrent transfers.
pub type ProgressFn<'a> = &'a (dyn Fn(&TransferProgress) + Send + Sync);

/// Options for recursive directory transfers.
#[derive(Clone, Copy)]
pub struct TreeTransfer<'a> {
    pub sync: SyncMode,
    pub remote_exists: RemoteExists,
    pub local_exists: LocalExists,
    pub parallelism: usize,
    pub progress: Option<ProgressFn<'a>>,
}

impl Default for TreeTransfer<'_> {
    fn default() -> Self {
        Self {
            sync: SyncMode::Update,
            remote_exists: RemoteExists::Overwrite,
            local_exists: LocalExists::Overwrite,
            parallelism: DEFAULT_PARALLELISM,
            progress: None,
        }
    }
}

impl<'a> TreeTransfer<'a> {
    pub fn sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn remote_exists(mut self, policy: RemoteExists) -> Self {
        self.remote_exists = policy;
        self
    }

    pub fn local_exists(mut self, policy: LocalExists) -> Self {
        self.local_exists = policy;
        self
    }

    pub fn progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for TreeTransfer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeTransfer")
            .field("sync", &self.sync)
            .field("remote_exists", &self.remote_exists)
            .field("local_exists", &self.local_exists)
            .field("parallelism", &self.parallelism)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Operations on a remote file tree over one logical session.
///
/// `connect` and `disconnect` are idempotent and every other operation
/// connects on demand. Implementations run each remote call through their
/// retry policy, so callers see only the final error.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    async fn file_exists(&self, path: &RemotePath) -> Result<bool>;

    async fn directory_exists(&self, path: &RemotePath) -> Result<bool>;

    async fn metadata(&self, path: &RemotePath) -> Result<RemoteMetadata>;

    /// Direct children of `path`. Not recursive.
    async fn list(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>>;

    /// Create `path` and any missing parents.
    async fn create_directory(&self, path: &RemotePath) -> Result<()>;

    /// Remove a directory. Absent directories are not an error.
    async fn delete_directory(&self, path: &RemotePath, recursive: bool) -> Result<()>;

    /// Remove a file. Absent files are not an error.
    async fn delete_file(&self, path: &RemotePath) -> Result<()>;

    /// Upload one file, creating remote parent directories as needed.
    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        exists: RemoteExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus>;

    /// Download one file, creating local parent directories as needed.
    async fn download_file(
        &self,
        remote: &RemotePath,
        local: &Path,
        exists: LocalExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus>;

    /// Rename a file or directory in one step.
    ///
    /// Never replaces an existing destination: an occupied `to` fails with
    /// [`TransportError::AlreadyExists`] and leaves both paths untouched. A
    /// missing `from` fails with [`TransportError::NotFound`].
    async fn move_entry(&self, from: &RemotePath, to: &RemotePath) -> Result<()>;

    async fn upload_directory(
        &self,
        local: &Path,
        remote: &RemotePath,
        options: &TreeTransfer<'_>,
    ) -> Result<TransferSummary> {
        upload_tree(self, local, remote, options).await
    }

    async fn download_directory(
        &self,
        remote: &RemotePath,
        local: &Path,
        options: &TreeTransfer<'_>,
    ) -> Result<TransferSummary> {
        download_tree(self, remote, local, options).await
    }

    /// Upload several files into one remote directory, at most `parallelism` at a time.
    async fn upload_many(
        &self,
        locals: &[PathBuf],
        remote_dir: &RemotePath,
        parallelism: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferSummary> {
        upload_batch(self, locals, remote_dir, parallelism, progress).await
    }

    /// Download `(remote, local)` pairs, at most `parallelism` at a time.
    async fn download_many(
        &self,
        pairs: &[(RemotePath, PathBuf)],
        parallelism: usize,
    ) -> Result<TransferSummary> {
        download_batch(self, pairs, parallelism).await
    }
}
