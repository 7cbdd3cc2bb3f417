// ABOUTME: Opens the pooled SSH transport a command runs against.
// ABOUTME: Closing disconnects the session and records a warning instead of failing.

use slotswap::config::Config;
use slotswap::diagnostics::{Diagnostics, Warning};
use slotswap::error::Result;
use slotswap::pool::{PooledTransport, TransportPool};
use slotswap::transport::{RemoteTransport, SshTransport};
use std::sync::Arc;

/// A pool of SSH sessions to one server plus the lease a command works through.
pub struct Remote {
    host: String,
    pool: Arc<TransportPool<SshTransport>>,
    transport: PooledTransport<SshTransport>,
}

impl Remote {
    /// Build the pool. No connection is made until the first remote call.
    pub fn open(config: &Config) -> Result<Self> {
        let session = config.server.session_config()?;
        let retry = config.retry;
        let host = session.host.clone();
        let pool = Arc::new(TransportPool::new(config.pool_size, move || {
            SshTransport::new(session.clone(), retry)
        }));
        let transport = PooledTransport::new(Arc::clone(&pool));
        Ok(Self {
            host,
            pool,
            transport,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn transport(&self) -> &PooledTransport<SshTransport> {
        &self.transport
    }

    /// Disconnect (non-fatal if it fails) and shut the pool down.
    pub async fn close(self, diag: &mut Diagnostics) {
        if let Err(e) = self.transport.disconnect().await {
            diag.warn(Warning::disconnect(format!(
                "SSH disconnect failed for {}: {}",
                self.host, e
            )));
        }
        self.transport.release();
        self.pool.shutdown().await;
    }
}
