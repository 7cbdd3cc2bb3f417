// ABOUTME: Bounded pool of reusable transport sessions.
// ABOUTME: A semaphore caps concurrent leases and a free list keeps idle sessions for reuse.

mod error;
mod lease;
mod pooled;

pub use error::{PoolError, PoolErrorKind};
pub use lease::TransportLease;
pub use pooled::PooledTransport;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::transport::RemoteTransport;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Hands out at most `capacity` sessions at a time.
///
/// Sessions are created on demand by the factory and kept open when a lease
/// ends, so the next lease reuses an already connected session.
pub struct TransportPool<T> {
    permits: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Arc<T>>>>,
    factory: Factory<T>,
    capacity: usize,
    created: AtomicUsize,
}

impl<T> std::fmt::Debug for TransportPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportPool")
            .field("capacity", &self.capacity)
            .field("available", &self.permits.available_permits())
            .field("idle", &self.idle.lock().len())
            .field("created", &self.created.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: RemoteTransport> TransportPool<T> {
    pub const DEFAULT_SIZE: usize = 8;

    /// Create a pool of `size` sessions (at least one).
    pub fn new(size: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let capacity = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            idle: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
            factory: Box::new(factory),
            capacity,
            created: AtomicUsize::new(0),
        }
    }

    /// Wait for a free session.
    pub async fn acquire(&self) -> Result<TransportLease<T>, PoolError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(self.lease(permit))
    }

    /// Claim a free session without waiting.
    pub fn try_acquire(&self) -> Result<TransportLease<T>, PoolError> {
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::Closed => PoolError::Closed,
                TryAcquireError::NoPermits => PoolError::Exhausted {
                    capacity: self.capacity,
                },
            })?;
        Ok(self.lease(permit))
    }

    fn lease(&self, permit: OwnedSemaphorePermit) -> TransportLease<T> {
        let reused = self.idle.lock().pop();
        let transport = match reused {
            Some(transport) => transport,
            None => {
                let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(created = n, capacity = self.capacity, "opening pooled session");
                Arc::new((self.factory)())
            }
        };
        TransportLease::new(transport, Arc::clone(&self.idle), permit)
    }

    /// Stop handing out sessions and disconnect the idle ones.
    ///
    /// Leases still held stay usable until they are released.
    pub async fn shutdown(&self) {
        self.permits.close();
        let sessions = std::mem::take(&mut *self.idle.lock());
        for session in sessions {
            if let Err(e) = session.disconnect().await {
                tracing::warn!(error = %e, "failed to disconnect pooled session");
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Leases that could be handed out right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Sessions created and currently parked in the free list.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Sessions built by the factory so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}
