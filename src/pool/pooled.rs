// ABOUTME: RemoteTransport adapter that runs every call on one lazily leased pool session.
// ABOUTME: Release is idempotent and also happens on drop.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{TransportLease, TransportPool};
use crate::transport::{
    LocalExists, ProgressFn, RemoteEntry, RemoteExists, RemoteMetadata, RemoteTransport, Result,
    TransferStatus, TransferSummary, TransportError, TreeTransfer,
};
use crate::types::RemotePath;

/// A transport that claims one pooled session on first use.
///
/// Concurrent first calls wait on a gate so only one lease is taken. After
/// [`release`](Self::release) every call fails with
/// [`TransportError::LeaseReleased`]. Calls already running keep the lease
/// alive, so the session only goes back to the pool once they finish.
pub struct PooledTransport<T> {
    pool: Arc<TransportPool<T>>,
    gate: tokio::sync::Mutex<()>,
    lease: parking_lot::Mutex<Option<Arc<TransportLease<T>>>>,
    released: AtomicBool,
}

impl<T: RemoteTransport> PooledTransport<T> {
    pub fn new(pool: Arc<TransportPool<T>>) -> Self {
        Self {
            pool,
            gate: tokio::sync::Mutex::new(()),
            lease: parking_lot::Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// Give the session back to the pool. Returns false if already released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        let lease = self.lease.lock().take();
        if lease.is_some() {
            tracing::debug!("released pooled session");
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether a session is currently leased.
    pub fn is_leased(&self) -> bool {
        self.lease.lock().is_some()
    }

    fn current(&self) -> Option<Arc<TransportLease<T>>> {
        self.lease.lock().clone()
    }

    async fn inner(&self) -> Result<Arc<TransportLease<T>>> {
        if self.is_released() {
            return Err(TransportError::LeaseReleased);
        }
        if let Some(transport) = self.current() {
            return Ok(transport);
        }

        let _gate = self.gate.lock().await;
        if let Some(transport) = self.current() {
            return Ok(transport);
        }

        let lease = Arc::new(self.pool.acquire().await?);
        let mut slot = self.lease.lock();
        // A release that raced the acquire wins; the fresh lease drops here.
        if self.is_released() {
            return Err(TransportError::LeaseReleased);
        }
        *slot = Some(Arc::clone(&lease));
        Ok(lease)
    }
}

impl<T> Drop for PooledTransport<T> {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
        self.lease.get_mut().take();
    }
}

#[async_trait]
impl<T: RemoteTransport> RemoteTransport for PooledTransport<T> {
    async fn connect(&self) -> Result<()> {
        self.inner().await?.connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        match self.current() {
            Some(transport) => transport.disconnect().await,
            None => Ok(()),
        }
    }

    async fn file_exists(&self, path: &RemotePath) -> Result<bool> {
        self.inner().await?.file_exists(path).await
    }

    async fn directory_exists(&self, path: &RemotePath) -> Result<bool> {
        self.inner().await?.directory_exists(path).await
    }

    async fn metadata(&self, path: &RemotePath) -> Result<RemoteMetadata> {
        self.inner().await?.metadata(path).await
    }

    async fn list(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        self.inner().await?.list(path).await
    }

    async fn create_directory(&self, path: &RemotePath) -> Result<()> {
        self.inner().await?.create_directory(path).await
    }

    async fn delete_directory(&self, path: &RemotePath, recursive: bool) -> Result<()> {
        self.inner().await?.delete_directory(path, recursive).await
    }

    async fn delete_file(&self, path: &RemotePath) -> Result<()> {
        self.inner().await?.delete_file(path).await
    }

    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        exists: RemoteExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        self.inner()
            .await?
            .upload_file(local, remote, exists, progress)
            .await
    }

    async fn download_file(
        &self,
        remote: &RemotePath,
        local: &Path,
        exists: LocalExists,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferStatus> {
        self.inner()
            .await?
            .download_file(remote, local, exists, progress)
            .await
    }

    async fn move_entry(&self, from: &RemotePath, to: &RemotePath) -> Result<()> {
        self.inner().await?.move_entry(from, to).await
    }

    async fn upload_directory(
        &self,
        local: &Path,
        remote: &RemotePath,
        options: &TreeTransfer<'_>,
    ) -> Result<TransferSummary> {
        self.inner()
            .await?
            .upload_directory(local, remote, options)
            .await
    }

    async fn download_directory(
        &self,
        remote: &RemotePath,
        local: &Path,
        options: &TreeTransfer<'_>,
    ) -> Result<TransferSummary> {
        self.inner()
            .await?
            .download_directory(remote, local, options)
            .await
    }

    async fn upload_many(
        &self,
        locals: &[PathBuf],
        remote_dir: &RemotePath,
        parallelism: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<TransferSummary> {
        self.inner()
            .await?
            .upload_many(locals, remote_dir, parallelism, progress)
            .await
    }

    async fn download_many(
        &self,
        pairs: &[(RemotePath, PathBuf)],
        parallelism: usize,
    ) -> Result<TransferSummary> {
        self.inner().await?.download_many(pairs, parallelism).await
    }
}
