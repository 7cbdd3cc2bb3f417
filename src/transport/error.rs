// ABOUTME: Error type shared by every RemoteTransport implementation.
// ABOUTME: Separates protocol failures, remote command failures and local I/O failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::pool::PoolError;
use crate::ssh;
use crate::types::RemotePath;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("ssh session error: {0}")]
    Ssh(#[from] ssh::Error),

    #[error("{operation} failed for {path}: {message}")]
    Remote {
        operation: &'static str,
        path: RemotePath,
        message: String,
    },

    #[error("remote path not found: {0}")]
    NotFound(RemotePath),

    #[error("remote path already exists: {0}")]
    AlreadyExists(RemotePath),

    #[error("remote path is not a directory: {0}")]
    NotADirectory(RemotePath),

    #[error("local I/O error at {}: {source}", path.display())]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk local directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("unexpected listing output: {0}")]
    InvalidListing(String),

    #[error("pooled transport was already released")]
    LeaseReleased,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("transfer queue closed")]
    Closed,
}

impl TransportError {
    pub(crate) fn local(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransportError::Local {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
