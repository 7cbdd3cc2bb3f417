// ABOUTME: Pool error types with SNAFU pattern.
// ABOUTME: Distinguishes a shut-down pool from a pool with no free session.

use snafu::Snafu;

/// Errors returned when claiming a session from a transport pool.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PoolError {
    #[snafu(display("transport pool is shut down"))]
    Closed,

    #[snafu(display("all {capacity} pooled sessions are in use"))]
    Exhausted { capacity: usize },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolErrorKind {
    /// The pool no longer hands out sessions.
    Closed,
    /// A non-blocking claim found every session leased.
    Exhausted,
}

impl PoolError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> PoolErrorKind {
        match self {
            PoolError::Closed => PoolErrorKind::Closed,
            PoolError::Exhausted { .. } => PoolErrorKind::Exhausted,
        }
    }
}
