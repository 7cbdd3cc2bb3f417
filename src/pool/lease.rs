// ABOUTME: Exclusive claim on one pooled transport session.
// ABOUTME: Dropping the lease parks the session in the free list and frees its permit.

use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

/// A session borrowed from a [`TransportPool`](super::TransportPool).
///
/// The session goes back to the pool when the lease is dropped; it is not
/// disconnected.
pub struct TransportLease<T> {
    transport: Arc<T>,
    idle: Arc<Mutex<Vec<Arc<T>>>>,
    _permit: OwnedSemaphorePermit,
}

impl<T> TransportLease<T> {
    pub(super) fn new(
        transport: Arc<T>,
        idle: Arc<Mutex<Vec<Arc<T>>>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            transport,
            idle,
            _permit: permit,
        }
    }

    /// Return the session to the pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for TransportLease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.transport
    }
}

impl<T> Drop for TransportLease<T> {
    fn drop(&mut self) {
        // The permit field drops after this, so the session is parked before
        // the next waiter can claim it.
        self.idle.lock().push(Arc::clone(&self.transport));
    }
}

impl<T> std::fmt::Debug for TransportLease<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportLease").finish_non_exhaustive()
    }
}
