// ABOUTME: Error types for deployment operations.
// ABOUTME: Carries the failing phase and the paths involved so failures can be reported precisely.

use std::path::PathBuf;

use crate::transport::TransportError;
use crate::types::RemotePath;

use super::outcome::Phase;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A remote operation failed outside of a move.
    #[error("{phase} failed: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: TransportError,
    },

    /// Upload finished but staging holds no files.
    #[error("staging validation failed: no files found in {0}")]
    EmptyStaging(RemotePath),

    /// A backup or promotion move failed. Earlier moves have been reversed.
    #[error("{phase} failed moving {from} to {to}: {source}")]
    MoveFailed {
        phase: Phase,
        from: RemotePath,
        to: RemotePath,
        #[source]
        source: TransportError,
    },

    /// A required production path is missing after promotion.
    #[error("health check failed for {path}: {reason}")]
    HealthCheckFailed { path: RemotePath, reason: String },

    /// Local artifact directory is missing.
    #[error("artifact directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Manual rollback requested with nothing retained.
    #[error("no backup to restore in {0}")]
    NoBackup(RemotePath),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Transport,
    EmptyStaging,
    MoveFailed,
    HealthCheckFailed,
    SourceNotFound,
    NoBackup,
}

impl DeployError {
    pub(crate) fn transport(phase: Phase) -> impl FnOnce(TransportError) -> Self {
        move |source| DeployError::Transport { phase, source }
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Transport { .. } => DeployErrorKind::Transport,
            DeployError::EmptyStaging(_) => DeployErrorKind::EmptyStaging,
            DeployError::MoveFailed { .. } => DeployErrorKind::MoveFailed,
            DeployError::HealthCheckFailed { .. } => DeployErrorKind::HealthCheckFailed,
            DeployError::SourceNotFound(_) => DeployErrorKind::SourceNotFound,
            DeployError::NoBackup(_) => DeployErrorKind::NoBackup,
        }
    }

    /// The phase that failed, when known.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            DeployError::Transport { phase, .. } | DeployError::MoveFailed { phase, .. } => {
                Some(*phase)
            }
            DeployError::EmptyStaging(_) => Some(Phase::Validate),
            DeployError::HealthCheckFailed { .. } => Some(Phase::HealthCheck),
            DeployError::SourceNotFound(_) => Some(Phase::Upload),
            DeployError::NoBackup(_) => Some(Phase::Rollback),
        }
    }
}
